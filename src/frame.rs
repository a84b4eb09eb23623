use image::RgbaImage;

/// Display time for frames that do not declare one.
pub const DEFAULT_DELAY_MS: u32 = 100;

/// One fully composited, displayable animation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbaImage,
    delay_ms: u32,
}

impl Frame {
    /// A zero delay falls back to [`DEFAULT_DELAY_MS`].
    pub fn new(image: RgbaImage, delay_ms: u32) -> Self {
        let delay_ms = if delay_ms == 0 { DEFAULT_DELAY_MS } else { delay_ms };
        Self { image, delay_ms }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, DEFAULT_DELAY_MS};
    use image::RgbaImage;

    #[test]
    fn zero_delay_uses_default() {
        assert_eq!(Frame::new(RgbaImage::new(1, 1), 0).delay_ms(), DEFAULT_DELAY_MS);
        assert_eq!(Frame::new(RgbaImage::new(1, 1), 40).delay_ms(), 40);
    }
}
