use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use animbg::{Assets, Camera, ViewGeometry};

mod gfx;
mod ppm_writer;

#[derive(Parser, Debug)]
#[command(name = "animbg", version, about = "Decode animated GIFs and play layered backgrounds")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a GIF and write every composited frame as a PPM
    Decode {
        /// GIF file to decode
        input: PathBuf,

        /// Directory the frames are written to
        #[arg(short, long, default_value = "frames")]
        out: PathBuf,
    },
    /// Play a background in a window
    View {
        /// Background number, loads gfx/level<N>.desc or gfx/level<N>.jpg
        #[arg(short, long)]
        level: u32,

        /// Directory holding the gfx/ asset folder
        #[arg(short, long, default_value = ".")]
        data_dir: PathBuf,

        #[arg(long, default_value_t = 640)]
        screen_width: u32,

        #[arg(long, default_value_t = 480)]
        screen_height: u32,

        /// Width of the arena the camera pans across
        #[arg(long, default_value_t = 1920)]
        arena_width: u32,

        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        camera_x: i32,

        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        camera_y: i32,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Decode { input, out } => decode(input, out),
        Command::View { level, data_dir, screen_width, screen_height, arena_width, camera_x, camera_y } => {
            let geometry = ViewGeometry { screen_width, screen_height, arena_width };
            let camera = Camera { x: camera_x, y: camera_y, y_shift: 0 };
            gfx::run(Assets::new(data_dir), level, geometry, camera)
        }
    }
}

fn decode(input: PathBuf, out: PathBuf) -> Result<()> {
    let data = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;

    let mut decoder = animbg::parser::Decoder::new(&data);
    decoder.parse().with_context(|| format!("decoding {}", input.display()))?;
    if decoder.frames().is_empty() {
        bail!("{} contains no decodable frames", input.display());
    }

    fs::create_dir_all(&out).with_context(|| format!("creating {}", out.display()))?;
    for (i, frame) in decoder.frames().iter().enumerate() {
        ppm_writer::write_ppm(&out.join(format!("frame_{}.ppm", i)), frame)?;
    }

    info!(
        "wrote {} frames to {} ({} images skipped, truncated: {})",
        decoder.frames().len(),
        out.display(),
        decoder.skipped_images(),
        decoder.is_truncated()
    );
    Ok(())
}
