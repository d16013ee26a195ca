use crate::config::load_config;
use crate::overlay_dump::write_overlay_dump;
use crate::parser::parse_capstone_log;
use crate::render::render_file;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(
    name = "capov",
    version,
    about = "Overlay capstone outlines, center dots and labels onto an image"
)]
pub struct Args {
    /// Input image
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output image; the format follows the extension
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Capstone log file, or '-' for stdin (the default)
    #[arg(short = 'l', long = "log")]
    pub log: Option<PathBuf>,

    /// Config JSON file (theme and overlay settings)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Integer upscale factor applied before drawing
    #[arg(short = 's', long = "scale", value_parser = clap::value_parser!(u32).range(1..))]
    pub scale: Option<u32>,

    /// Write extracted records and label placements as JSON
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    run_with_args(Args::parse())
}

pub fn run_with_args(args: Args) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(scale) = args.scale {
        config.overlay.scale = scale;
    }

    let log = read_log(args.log.as_deref())?;
    let capstones = parse_capstone_log(&log);
    if capstones.is_empty() {
        warn!("No capstones found.");
    }

    let report = render_file(&args.input, &args.output, &capstones, &config)?;

    if let Some(path) = args.dump.as_deref() {
        write_overlay_dump(path, &capstones, &report)
            .with_context(|| format!("failed to write dump {}", path.display()))?;
    }
    Ok(())
}

fn read_log(path: Option<&Path>) -> Result<String> {
    let bytes = match path {
        Some(path) if path != Path::new("-") => std::fs::read(path)
            .with_context(|| format!("failed to read log {}", path.display()))?,
        _ => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                eprintln!("Waiting for log data on stdin...");
            }
            let mut buf = Vec::new();
            stdin
                .lock()
                .read_to_end(&mut buf)
                .context("failed to read log from stdin")?;
            buf
        }
    };
    Ok(decode_log(bytes))
}

/// Invalid UTF-8 is replaced rather than rejected; the affected lines simply
/// stop matching.
fn decode_log(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                offset = err.utf8_error().valid_up_to(),
                "log is not valid UTF-8, replacing invalid bytes"
            );
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}
