use std::io::{prelude::*, BufWriter};
use std::fs::File;
use std::path::Path;
use anyhow::{Context, Result};

use animbg::Frame;

const MAGIC_NUMBER: &[u8] = b"P3";

/// Writes a frame as a plain-text PPM, flattening alpha over black.
pub fn write_ppm(filename: &Path, frame: &Frame) -> Result<()> {
    let file = File::create(filename).with_context(|| format!("creating {}", filename.display()))?;

    let mut writer = BufWriter::new(&file);
    write_pixels(&mut writer, frame)?;
    writer.flush()?;

    Ok(())
}

fn write_pixels<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    let image = frame.image();
    let width = image.width();

    writer.write_all(MAGIC_NUMBER)?;
    writer.write_all(b"\n")?;
    writer.write_all(format!("{} {}", width, image.height()).as_bytes())?;
    writer.write_all(b" 255")?;
    writer.write_all(b"\n")?;

    for row in image.rows() {
        for (i, pixel) in row.enumerate() {
            let alpha = u32::from(pixel[3]);
            let [red, green, blue] = [0, 1, 2].map(|channel| u32::from(pixel[channel]) * alpha / 255);

            write!(writer, "{: >3} {: >3} {: >3}", red, green, blue)?;
            if i as u32 != width - 1 {
                writer.write_all(b" ")?;
            }
        }
        writer.write_all(b"\n")?;
    }

    Ok(())
}
