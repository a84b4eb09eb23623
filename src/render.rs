//! Pixel blending and the seam between backgrounds and whatever presents them.

use image::{Rgba, RgbaImage};

/// Reference geometry the parallax math is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewGeometry {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Width of the whole scrollable arena the camera moves across.
    pub arena_width: u32,
}

impl Default for ViewGeometry {
    fn default() -> Self {
        Self {
            screen_width: 640,
            screen_height: 480,
            arena_width: 1920,
        }
    }
}

impl ViewGeometry {
    /// Parallax distance that makes an image of `width` pixels span exactly the arena:
    /// `(arena - screen) * distance = width - screen`.
    pub fn distance_for_width(&self, width: u32) -> f64 {
        let travel = f64::from(self.arena_width) - f64::from(self.screen_width);
        if travel <= 0.0 {
            return 1.0;
        }
        (f64::from(width) - f64::from(self.screen_width)) / travel
    }
}

/// Camera position for one draw.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    /// Added to every layer's vertical position after parallax.
    pub y_shift: i32,
}

/// One frame buffer to present this tick, at its display position.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub image: &'a RgbaImage,
    pub x: i32,
    pub y: i32,
    pub opacity: u8,
}

/// Anything a [`Placement`] can be painted onto.
pub trait RenderTarget {
    fn blit(&mut self, source: &RgbaImage, x: i32, y: i32, opacity: u8);
}

impl RenderTarget for RgbaImage {
    fn blit(&mut self, source: &RgbaImage, x: i32, y: i32, opacity: u8) {
        if opacity == 0 {
            return;
        }

        // clip the source rectangle against the target
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (i64::from(x) + i64::from(source.width())).min(i64::from(self.width())) as i32;
        let y1 = (i64::from(y) + i64::from(source.height())).min(i64::from(self.height())) as i32;

        for target_y in y0..y1 {
            for target_x in x0..x1 {
                let src = *source.get_pixel((target_x - x) as u32, (target_y - y) as u32);
                blend_over(self.get_pixel_mut(target_x as u32, target_y as u32), src, opacity);
            }
        }
    }
}

/// Source-over compositing of straight-alpha pixels, with the source alpha scaled by
/// `opacity`.
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: u8) {
    let src_alpha = u32::from(src[3]) * u32::from(opacity) / 255;
    if src_alpha == 0 {
        return;
    }
    if src_alpha == 255 {
        *dst = Rgba([src[0], src[1], src[2], 255]);
        return;
    }

    let dst_alpha = u32::from(dst[3]) * (255 - src_alpha) / 255;
    let out_alpha = src_alpha + dst_alpha;
    for channel in 0..3 {
        let value = u32::from(src[channel]) * src_alpha + u32::from(dst[channel]) * dst_alpha;
        dst[channel] = ((value + out_alpha / 2) / out_alpha) as u8;
    }
    dst[3] = out_alpha as u8;
}
