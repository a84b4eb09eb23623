// (first row, row step) of the four passes, in the order they are stored
const PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Row indices of an interlaced image in storage order.
fn stored_rows(height: usize) -> impl Iterator<Item = usize> {
    PASSES
        .iter()
        .flat_map(move |&(start, step)| (start..height).step_by(step))
}

/// Moves rows stored in pass order back to top-to-bottom order.
/// `pixels` must hold exactly `width * height` indices.
pub fn deinterlace(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    debug_assert_eq!(pixels.len(), width * height);

    let mut out = vec![0; pixels.len()];
    for (source_row, target_row) in pixels.chunks_exact(width).zip(stored_rows(height)) {
        out[target_row * width..(target_row + 1) * width].copy_from_slice(source_row);
    }
    out
}

/// Inverse of [`deinterlace`], lays rows out in pass order.
#[cfg(test)]
pub fn interlace(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len());
    for row in stored_rows(height) {
        out.extend_from_slice(&pixels[row * width..(row + 1) * width]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{deinterlace, interlace};

    #[test]
    fn restores_row_order() {
        // one pixel per row, each holding its stored position
        let stored: Vec<u8> = (0..10).collect();
        let rows = deinterlace(&stored, 1, 10);
        // pass 1: rows 0, 8; pass 2: row 4; pass 3: rows 2, 6; pass 4: rows 1, 3, 5, 7, 9
        assert_eq!(rows, vec![0, 5, 3, 6, 2, 7, 4, 8, 1, 9]);
    }

    #[test]
    fn interlace_then_deinterlace_is_identity() {
        for height in 1..=20 {
            for width in 1..=4 {
                let original: Vec<u8> = (0..width * height).map(|i| (i * 7 % 251) as u8).collect();
                let stored = interlace(&original, width, height);
                assert_eq!(deinterlace(&stored, width, height), original, "{width}x{height}");
            }
        }
    }
}
