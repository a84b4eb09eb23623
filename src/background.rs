//! Multi-layer parallax backgrounds built from still images, GIFs and frame sequences.

use image::RgbaImage;
use log::{debug, info, warn};

use crate::assets::{AssetError, Assets, ImageLoader};
use crate::description::{parse_description, LayerDescription, LayerKind};
use crate::frame::Frame;
use crate::playback::{Playback, PlaybackOptions};
use crate::render::{Camera, Placement, RenderTarget, ViewGeometry};
use crate::scroll::AutoScroll;

/// Decoded frames of an animated layer together with its playback position. Always holds
/// at least one frame.
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<Frame>,
    delays: Vec<u32>,
    playback: Playback,
}

impl Animation {
    /// `None` when there are no frames to play.
    pub fn new(frames: Vec<Frame>, options: PlaybackOptions, now_ms: u64) -> Option<Self> {
        let first_delay = frames.first()?.delay_ms();
        let delays = frames.iter().map(Frame::delay_ms).collect();
        Some(Self {
            frames,
            delays,
            playback: Playback::new(options, now_ms, first_delay),
        })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn current_frame(&self) -> &Frame {
        &self.frames[self.playback.current()]
    }

    fn tick(&mut self, now_ms: u64) {
        self.playback.tick(now_ms, &self.delays);
    }
}

#[derive(Debug, Clone)]
pub enum LayerContent {
    Static(RgbaImage),
    Animated(Animation),
}

#[derive(Debug, Clone)]
pub struct Layer {
    content: LayerContent,
    x_offset: i32,
    y_offset: i32,
    distance: f64,
    opacity: u8,
    scroll: AutoScroll,
}

impl Layer {
    pub fn new(content: LayerContent) -> Self {
        Self {
            content,
            x_offset: 0,
            y_offset: 0,
            distance: 1.0,
            opacity: u8::MAX,
            scroll: AutoScroll::default(),
        }
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.x_offset = x;
        self.y_offset = y;
        self
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_scroll(mut self, scroll: AutoScroll) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn content(&self) -> &LayerContent {
        &self.content
    }

    pub fn is_animated(&self) -> bool {
        matches!(self.content, LayerContent::Animated(_))
    }

    pub fn offset(&self) -> (i32, i32) {
        (self.x_offset, self.y_offset)
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn scroll(&self) -> &AutoScroll {
        &self.scroll
    }

    /// The image shown this tick.
    pub fn current_image(&self) -> &RgbaImage {
        match &self.content {
            LayerContent::Static(image) => image,
            LayerContent::Animated(animation) => animation.current_frame().image(),
        }
    }

    /// Advances playback and scrolling to `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        if let LayerContent::Animated(animation) = &mut self.content {
            animation.tick(now_ms);
        }
        self.scroll.tick(now_ms);
    }

    fn place<'a>(&'a self, camera: Camera, geometry: &ViewGeometry, out: &mut Vec<Placement<'a>>) {
        let image = self.current_image();
        let x = self.x_offset - (f64::from(camera.x) * self.distance) as i32;
        let y = self.y_offset - (f64::from(camera.y) * self.distance) as i32 + camera.y_shift;

        if !self.scroll.is_moving() {
            out.push(Placement { image, x, y, opacity: self.opacity });
            return;
        }

        let (width, height) = (image.width() as i32, image.height() as i32);
        let (scroll_x, scroll_y) = self.scroll.wrapped(image.width(), image.height());
        let x = if scroll_x > 0 { x + scroll_x - width } else { x };
        let y = if scroll_y > 0 { y + scroll_y - height } else { y };

        // fill the gap the wrapped tile leaves behind it with a second copy, only along
        // the axes the layer scrolls on
        let (velocity_x, velocity_y) = self.scroll.velocity();
        let columns = if velocity_x != 0.0 { tile_starts(x, width, geometry.screen_width) } else { vec![x] };
        let rows = if velocity_y != 0.0 { tile_starts(y, height, geometry.screen_height) } else { vec![y] };
        for &y in &rows {
            for &x in &columns {
                out.push(Placement { image, x, y, opacity: self.opacity });
            }
        }
    }
}

fn tile_starts(start: i32, size: i32, visible: u32) -> Vec<i32> {
    let mut starts = vec![start];
    if size > 0 && i64::from(start) + i64::from(size) < i64::from(visible) {
        starts.push(start + size);
    }
    starts
}

/// Ordered layers drawn back to front. Layers past `first_extra_layer` were added after
/// loading and can be dropped again as a group.
#[derive(Debug, Default)]
pub struct Background {
    number: u32,
    first_extra_layer: usize,
    ok: bool,
    layers: Vec<Layer>,
}

impl Background {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every layer and its frames.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.ok = false;
        self.number = 0;
        self.first_extra_layer = 0;
    }

    /// Loads background `number`, from its description file when there is one and from a
    /// single image otherwise. Layers whose assets fail to load are left out.
    ///
    /// A single-image background takes its distance from the image width, see
    /// [`ViewGeometry::distance_for_width`].
    pub fn load<L: ImageLoader>(&mut self, number: u32, assets: &Assets<L>, geometry: &ViewGeometry, now_ms: u64) {
        self.clear();

        let description_path = assets.level_description_path(number);
        match assets.read_text(&description_path) {
            Ok(text) => match parse_description(&text) {
                Ok(descriptions) => {
                    for description in &descriptions {
                        match load_layer(description, assets, now_ms) {
                            Ok(layer) => self.layers.push(layer),
                            Err(err) => warn!("skipping layer {}: {err}", description.filename),
                        }
                    }
                }
                Err(err) => warn!("cannot parse {}: {err}", description_path.display()),
            },
            Err(err) => {
                debug!("{err}, trying a single image background");
                let name = Assets::<L>::level_image_name(number);
                match assets.load_image(&name) {
                    Ok(image) => {
                        let distance = geometry.distance_for_width(image.width());
                        self.layers
                            .push(Layer::new(LayerContent::Static(image)).with_distance(distance));
                    }
                    Err(err) => warn!("cannot load background {number}: {err}"),
                }
            }
        }

        self.first_extra_layer = self.layers.len();
        self.ok = !self.layers.is_empty();
        self.number = if self.ok { number } else { 0 };
        if self.ok {
            info!("loaded background {number} with {} layers", self.layers.len());
        }
    }

    /// Appends a layer after the loaded ones.
    pub fn add_extra_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Removes every layer added with [`Background::add_extra_layer`].
    pub fn delete_extra_layers(&mut self) {
        self.layers.truncate(self.first_extra_layer);
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn first_extra_layer(&self) -> usize {
        self.first_extra_layer
    }

    /// Advances every layer's animation and scroll to `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        for layer in &mut self.layers {
            layer.advance(now_ms);
        }
    }

    /// What to present this tick, back to front.
    pub fn placements(&self, camera: Camera, geometry: &ViewGeometry) -> Vec<Placement<'_>> {
        let mut placements = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            layer.place(camera, geometry, &mut placements);
        }
        placements
    }

    /// Advances to `now_ms` and paints every layer onto `target`.
    pub fn draw<T: RenderTarget>(&mut self, target: &mut T, camera: Camera, geometry: &ViewGeometry, now_ms: u64) {
        self.advance(now_ms);
        for placement in self.placements(camera, geometry) {
            target.blit(placement.image, placement.x, placement.y, placement.opacity);
        }
    }
}

fn load_layer<L: ImageLoader>(description: &LayerDescription, assets: &Assets<L>, now_ms: u64) -> Result<Layer, AssetError> {
    let attributes = &description.attributes;

    let content = match description.kind() {
        LayerKind::Still => LayerContent::Static(assets.load_image(&description.filename)?),
        kind => {
            let frames = if kind == LayerKind::Gif {
                assets.load_gif(&description.filename)?
            } else {
                assets.load_sequence(&description.filename)?
            };
            let path = assets.gfx_path(&description.filename);
            let animation = Animation::new(frames, attributes.playback, now_ms).ok_or(AssetError::NoFrames(path))?;
            LayerContent::Animated(animation)
        }
    };

    let mut scroll = AutoScroll::new(attributes.scroll.0, attributes.scroll.1);
    scroll.tick(now_ms);

    Ok(Layer::new(content)
        .with_offset(description.x_offset, description.y_offset)
        .with_distance(description.distance)
        .with_opacity(attributes.opacity)
        .with_scroll(scroll))
}
