//! Where background assets live and how they are turned into frames.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::{debug, info};
use thiserror::Error;

use crate::frame::Frame;
use crate::parser::{self, ParserError};
use crate::sequence;

/// Subdirectory of the data directory holding every graphic asset.
pub const GFX_DIR: &str = "gfx";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot decode gif {path}: {source}")]
    Gif {
        path: PathBuf,
        #[source]
        source: ParserError,
    },

    #[error("{0} produced no frames")]
    NoFrames(PathBuf),
}

/// Decodes still images in any common raster format.
pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<RgbaImage, AssetError>;
}

/// Loads still images from disk through the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskImageLoader;

impl ImageLoader for DiskImageLoader {
    fn load(&self, path: &Path) -> Result<RgbaImage, AssetError> {
        let image = image::open(path).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(image.to_rgba8())
    }
}

/// Resolves asset names against the data directory and loads them.
#[derive(Debug, Clone)]
pub struct Assets<L = DiskImageLoader> {
    data_dir: PathBuf,
    loader: L,
}

impl Assets<DiskImageLoader> {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_loader(data_dir, DiskImageLoader)
    }
}

impl<L: ImageLoader> Assets<L> {
    pub fn with_loader(data_dir: impl Into<PathBuf>, loader: L) -> Self {
        Self {
            data_dir: data_dir.into(),
            loader,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn gfx_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(GFX_DIR).join(name)
    }

    /// Description file of a multi-layer background.
    pub fn level_description_path(&self, number: u32) -> PathBuf {
        self.gfx_path(&format!("level{number}.desc"))
    }

    /// Single image used when a background has no description file.
    pub fn level_image_name(number: u32) -> String {
        format!("level{number}.jpg")
    }

    pub fn read_text(&self, path: &Path) -> Result<String, AssetError> {
        fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads a still image from the gfx directory.
    pub fn load_image(&self, name: &str) -> Result<RgbaImage, AssetError> {
        self.loader.load(&self.gfx_path(name))
    }

    /// Decodes an animated GIF from the gfx directory.
    pub fn load_gif(&self, name: &str) -> Result<Vec<Frame>, AssetError> {
        let path = self.gfx_path(name);
        let frames = load_animated_gif(&path)?;
        if frames.is_empty() {
            return Err(AssetError::NoFrames(path));
        }
        Ok(frames)
    }

    /// Loads a frame-sequence descriptor from the gfx directory. Frames that fail to load
    /// are left out.
    pub fn load_sequence(&self, name: &str) -> Result<Vec<Frame>, AssetError> {
        let path = self.gfx_path(name);
        let text = self.read_text(&path)?;

        let frames: Vec<Frame> = sequence::parse_sequence(&text)
            .into_iter()
            .filter_map(|entry| match self.load_image(&entry.filename) {
                Ok(image) => Some(Frame::new(image, entry.delay_ms)),
                Err(err) => {
                    debug!("cannot load frame {}: {err}", entry.filename);
                    None
                }
            })
            .collect();

        if frames.is_empty() {
            debug!("no frames in sequence {}", path.display());
            return Err(AssetError::NoFrames(path));
        }
        debug!("loaded {} frames from sequence {}", frames.len(), path.display());
        Ok(frames)
    }
}

/// Reads and decodes a GIF file. A truncated file yields the frames before the cut.
pub fn load_animated_gif(path: &Path) -> Result<Vec<Frame>, AssetError> {
    let data = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let frames = parser::decode(&data).map_err(|source| AssetError::Gif {
        path: path.to_path_buf(),
        source,
    })?;

    if frames.is_empty() {
        debug!("no frames decoded from {}", path.display());
    } else {
        info!("loaded {} frames from {}", frames.len(), path.display());
    }
    Ok(frames)
}
