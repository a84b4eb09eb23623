use super::{ColorTable, DisposalMethod};
use crate::frame::Frame;
use crate::render::RenderTarget;

use image::{Rgba, RgbaImage};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Placement of a sub-image on the logical screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
}

/// Per-image rendering state taken from the graphic control extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawControl {
    pub disposal_method: DisposalMethod,
    pub transparent_index: Option<u8>,
    pub delay_ms: u32,
}

/// Owns the logical-screen canvas for one decode, plus the snapshot used by
/// restore-to-previous disposal.
#[derive(Debug)]
pub struct Compositor {
    canvas: RgbaImage,
    previous: RgbaImage,
}

impl Compositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, TRANSPARENT),
            previous: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    /// Composites one sub-image, returns a snapshot of the whole canvas, then disposes
    /// the sub-image so the canvas is ready for the next one.
    ///
    /// `indicies` must hold `width * height` entries in top-to-bottom row order.
    pub fn draw(&mut self, rect: Rect, indicies: &[u8], palette: &ColorTable, control: &DrawControl) -> Frame {
        debug_assert_eq!(indicies.len(), rect.width as usize * rect.height as usize);

        if control.disposal_method == DisposalMethod::RestoreToPrevious {
            self.previous.clone_from(&self.canvas);
        }

        // only the part of the sub-image that lands on the canvas is built
        let width = u32::from(rect.width);
        let (visible_width, visible_height) = self.visible_size(rect);
        let sub_image = RgbaImage::from_fn(visible_width, visible_height, |x, y| {
            let index = indicies[(y * width + x) as usize];
            let rgb = palette.get(index);
            let alpha = if control.transparent_index == Some(index) { 0 } else { 255 };
            Rgba([rgb[0], rgb[1], rgb[2], alpha])
        });

        self.canvas
            .blit(&sub_image, i32::from(rect.left), i32::from(rect.top), u8::MAX);

        let frame = Frame::new(self.canvas.clone(), control.delay_ms);

        match control.disposal_method {
            DisposalMethod::RestoreToBackgroundColor => self.clear(rect),
            DisposalMethod::RestoreToPrevious => self.canvas.clone_from(&self.previous),
            DisposalMethod::Unspecified | DisposalMethod::DoNotDispose => {}
        }

        frame
    }

    /// Width and height of `rect` once clipped to the canvas.
    fn visible_size(&self, rect: Rect) -> (u32, u32) {
        let clip = |start: u16, size: u16, limit: u32| {
            (u32::from(start) + u32::from(size)).min(limit).saturating_sub(u32::from(start))
        };
        (
            clip(rect.left, rect.width, self.canvas.width()),
            clip(rect.top, rect.height, self.canvas.height()),
        )
    }

    fn clear(&mut self, rect: Rect) {
        let (width, height) = self.visible_size(rect);
        let (left, top) = (u32::from(rect.left), u32::from(rect.top));

        for y in top..top + height {
            for x in left..left + width {
                self.canvas.put_pixel(x, y, TRANSPARENT);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> ColorTable {
        // 0 red, 1 green, 2 blue, 3 white
        ColorTable::from_bytes(&[255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255])
    }

    fn rect(left: u16, top: u16, width: u16, height: u16) -> Rect {
        Rect { left, top, width, height }
    }

    #[test]
    fn transparent_index_keeps_canvas_pixel() {
        let mut compositor = Compositor::new(2, 1);
        let control = DrawControl::default();
        compositor.draw(rect(0, 0, 2, 1), &[0, 0], &palette(), &control);

        let control = DrawControl { transparent_index: Some(2), ..DrawControl::default() };
        let frame = compositor.draw(rect(0, 0, 2, 1), &[1, 2], &palette(), &control);

        assert_eq!(*frame.image().get_pixel(0, 0), Rgba([0, 255, 0, 255]));
        assert_eq!(*frame.image().get_pixel(1, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn frame_covers_whole_canvas() {
        let mut compositor = Compositor::new(4, 3);
        let frame = compositor.draw(rect(1, 1, 1, 1), &[3], &palette(), &DrawControl::default());

        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert_eq!(*frame.image().get_pixel(1, 1), Rgba([255, 255, 255, 255]));
        assert_eq!(*frame.image().get_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn sub_image_is_clipped_to_canvas() {
        let mut compositor = Compositor::new(2, 2);
        let frame = compositor.draw(rect(1, 1, 2, 2), &[1, 1, 1, 1], &palette(), &DrawControl::default());
        assert_eq!(*frame.image().get_pixel(1, 1), Rgba([0, 255, 0, 255]));
        assert_eq!(*frame.image().get_pixel(0, 1), TRANSPARENT);
    }

    #[test]
    fn sub_image_outside_canvas_leaves_it_untouched() {
        let mut compositor = Compositor::new(2, 1);
        let before = compositor.draw(rect(0, 0, 2, 1), &[1, 2], &palette(), &DrawControl::default());

        let control = DrawControl {
            disposal_method: DisposalMethod::RestoreToBackgroundColor,
            ..DrawControl::default()
        };
        let frame = compositor.draw(rect(5, 0, 3, 1), &[0, 0, 0], &palette(), &control);
        assert_eq!(frame.image(), before.image());
        assert_eq!((frame.width(), frame.height()), (2, 1));
    }

    #[test]
    fn restore_to_background_clears_region_after_frame() {
        let mut compositor = Compositor::new(3, 1);
        compositor.draw(rect(0, 0, 3, 1), &[0, 0, 0], &palette(), &DrawControl::default());

        let control = DrawControl {
            disposal_method: DisposalMethod::RestoreToBackgroundColor,
            ..DrawControl::default()
        };
        let shown = compositor.draw(rect(1, 0, 1, 1), &[2], &palette(), &control);
        assert_eq!(*shown.image().get_pixel(1, 0), Rgba([0, 0, 255, 255]));

        // fully transparent follow-up image exposes the canvas as disposed
        let clear = DrawControl { transparent_index: Some(0), ..DrawControl::default() };
        let next = compositor.draw(rect(0, 0, 1, 1), &[0], &palette(), &clear);
        assert_eq!(*next.image().get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*next.image().get_pixel(1, 0), TRANSPARENT);
        assert_eq!(*next.image().get_pixel(2, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn restore_to_previous_rolls_back_the_draw() {
        let mut compositor = Compositor::new(2, 2);
        let before = compositor.draw(rect(0, 0, 2, 2), &[0, 1, 2, 3], &palette(), &DrawControl::default());

        let control = DrawControl {
            disposal_method: DisposalMethod::RestoreToPrevious,
            ..DrawControl::default()
        };
        let shown = compositor.draw(rect(0, 0, 2, 1), &[3, 3], &palette(), &control);
        assert_ne!(shown.image(), before.image());

        let clear = DrawControl { transparent_index: Some(0), ..DrawControl::default() };
        let next = compositor.draw(rect(0, 0, 1, 1), &[0], &palette(), &clear);
        assert_eq!(next.image(), before.image());
    }
}
