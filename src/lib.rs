//! Animated, parallax-scrolling background layers with a self-contained GIF decoder.

pub mod assets;
pub mod background;
pub mod description;
pub mod frame;
pub mod parser;
pub mod playback;
pub mod render;
pub mod scroll;
pub mod sequence;

pub use assets::{Assets, DiskImageLoader, ImageLoader};
pub use background::{Animation, Background, Layer, LayerContent};
pub use frame::Frame;
pub use render::{Camera, Placement, RenderTarget, ViewGeometry};
