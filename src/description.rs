//! Background description files.
//!
//! The first line holds the number of layers. Each layer then gives its filename on one
//! line and `x y distance [attributes...]` on the next (both may share a line). Attributes
//! are whitespace separated:
//!
//! - `alpha=0..255` layer opacity
//! - `scroll=dx,dy` auto-scroll velocity in pixels per second
//! - `pingpong` play animations back and forth
//! - `loops=N` number of loops, `-1` for forever

use std::path::Path;

use log::warn;
use thiserror::Error;

use crate::playback::{LoopCount, PlaybackOptions};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptionError {
    #[error("description is empty")]
    MissingLayerCount,

    #[error("layer count {0:?} is not a number")]
    InvalidLayerCount(String),
}

/// What loads a layer's file, picked by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Still,
    Gif,
    FrameSequence,
}

impl LayerKind {
    pub fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename).extension().and_then(|extension| extension.to_str());
        match extension {
            Some(extension) if extension.eq_ignore_ascii_case("gif") => LayerKind::Gif,
            Some(extension) if extension.eq_ignore_ascii_case("anim") => LayerKind::FrameSequence,
            _ => LayerKind::Still,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerAttributes {
    pub opacity: u8,
    pub scroll: (f64, f64),
    pub playback: PlaybackOptions,
}

impl Default for LayerAttributes {
    fn default() -> Self {
        Self {
            opacity: u8::MAX,
            scroll: (0.0, 0.0),
            playback: PlaybackOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescription {
    pub filename: String,
    pub x_offset: i32,
    pub y_offset: i32,
    pub distance: f64,
    pub attributes: LayerAttributes,
}

impl LayerDescription {
    pub fn kind(&self) -> LayerKind {
        LayerKind::from_filename(&self.filename)
    }
}

/// Parses a description. Layers with unreadable geometry are left out, as are layers
/// missing once the text runs out.
pub fn parse_description(text: &str) -> Result<Vec<LayerDescription>, DescriptionError> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let count_line = lines.next().ok_or(DescriptionError::MissingLayerCount)?;
    let count_token = count_line.split_whitespace().next().unwrap_or_default();
    let count: usize = count_token
        .parse()
        .map_err(|_| DescriptionError::InvalidLayerCount(count_token.to_owned()))?;

    let mut layers = Vec::with_capacity(count);
    for index in 0..count {
        let Some(name_line) = lines.next() else {
            warn!("description declares {count} layers but ends after {index}");
            break;
        };

        let mut tokens = name_line.split_whitespace();
        let filename = tokens.next().unwrap_or_default().to_owned();
        let rest: Vec<&str> = tokens.collect();
        let geometry: Vec<&str> = if rest.is_empty() {
            match lines.next() {
                Some(line) => line.split_whitespace().collect(),
                None => {
                    warn!("layer {filename} has no geometry line");
                    break;
                }
            }
        } else {
            rest
        };

        match parse_layer(filename, &geometry) {
            Some(layer) => layers.push(layer),
            None => warn!("skipping layer {index}, cannot read geometry {:?}", geometry),
        }
    }

    Ok(layers)
}

fn parse_layer(filename: String, tokens: &[&str]) -> Option<LayerDescription> {
    let [x, y, distance, attributes @ ..] = tokens else {
        return None;
    };

    Some(LayerDescription {
        filename,
        x_offset: x.parse().ok()?,
        y_offset: y.parse().ok()?,
        distance: distance.parse().ok()?,
        attributes: parse_attributes(attributes),
    })
}

fn parse_attributes(tokens: &[&str]) -> LayerAttributes {
    let mut attributes = LayerAttributes::default();

    for token in tokens {
        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (*token, None),
        };

        let parsed = match (key, value) {
            ("pingpong", None) => {
                attributes.playback.ping_pong = true;
                true
            }
            ("alpha", Some(value)) => value
                .parse::<i64>()
                .map(|alpha| attributes.opacity = alpha.clamp(0, 255) as u8)
                .is_ok(),
            ("loops", Some(value)) => value
                .parse::<i64>()
                .map(|loops| attributes.playback.loops = LoopCount::from_signed(loops))
                .is_ok(),
            ("scroll", Some(value)) => match value.split_once(',') {
                Some((dx, dy)) => match (dx.parse::<f64>(), dy.parse::<f64>()) {
                    (Ok(dx), Ok(dy)) => {
                        attributes.scroll = (dx, dy);
                        true
                    }
                    _ => false,
                },
                None => false,
            },
            _ => false,
        };

        if !parsed {
            warn!("ignoring layer attribute {token:?}");
        }
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_layer_with_attributes() {
        let layers = parse_description("1\nclouds.gif 0 0 0.2 scroll=-40,0 alpha=200\n").unwrap();
        assert_eq!(layers.len(), 1);

        let clouds = &layers[0];
        assert_eq!(clouds.filename, "clouds.gif");
        assert_eq!(clouds.kind(), LayerKind::Gif);
        assert_eq!(clouds.distance, 0.2);
        assert_eq!(clouds.attributes.scroll, (-40.0, 0.0));
        assert_eq!(clouds.attributes.opacity, 200);
        assert!(!clouds.attributes.playback.ping_pong);
        assert_eq!(clouds.attributes.playback.loops, LoopCount::Infinite);
    }

    #[test]
    fn two_line_layers() {
        let text = "3\n\
                    sky.jpg\n\
                    0 0 0.0\n\
                    torch.anim\n\
                    -20 35 1.5 pingpong loops=3\n\
                    flag.GIF\n\
                    100 50 1 loops=-1 alpha=999\n";
        let layers = parse_description(text).unwrap();
        assert_eq!(layers.len(), 3);

        assert_eq!(layers[0].kind(), LayerKind::Still);
        assert_eq!(layers[0].attributes, LayerAttributes::default());

        assert_eq!(layers[1].kind(), LayerKind::FrameSequence);
        assert_eq!((layers[1].x_offset, layers[1].y_offset), (-20, 35));
        assert_eq!(
            layers[1].attributes.playback,
            PlaybackOptions { ping_pong: true, loops: LoopCount::Finite(3) }
        );

        assert_eq!(layers[2].kind(), LayerKind::Gif);
        assert_eq!(layers[2].distance, 1.0);
        assert_eq!(layers[2].attributes.opacity, 255);
        assert_eq!(layers[2].attributes.playback.loops, LoopCount::Infinite);
    }

    #[test]
    fn malformed_attributes_are_ignored() {
        let layers = parse_description("1\na.png 0 0 1 scroll=5 alpha=x shimmer pingpong=1\n").unwrap();
        assert_eq!(layers[0].attributes, LayerAttributes::default());
    }

    #[test]
    fn bad_geometry_skips_only_that_layer() {
        let layers = parse_description("2\na.png\n0 zero 1\nb.png\n1 2 3\n").unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].filename, "b.png");
    }

    #[test]
    fn short_description_keeps_complete_layers() {
        let layers = parse_description("3\na.png\n1 2 0.5\nb.png\n").unwrap();
        assert_eq!(layers.len(), 1);
    }

    #[test]
    fn layer_count_must_be_numeric() {
        assert_eq!(parse_description(""), Err(DescriptionError::MissingLayerCount));
        assert_eq!(
            parse_description("many\n"),
            Err(DescriptionError::InvalidLayerCount("many".into()))
        );
    }
}
