use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to open image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to save image {}: {source}", path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot scale a {width}x{height} image by {factor}")]
    InvalidScale { width: u32, height: u32, factor: u32 },
    #[error("failed to allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error("invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = OverlayError> = std::result::Result<T, E>;
