use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("grid {width}x{height} is empty or larger than {} cells", crate::grid::MAX_CELLS)]
    InvalidDimensions { width: usize, height: usize },

    #[error("{n_frames} frames of {width}x{height} exceed {} pixels", crate::config::MAX_FRAME_PIXELS)]
    TooManyFrames {
        n_frames: usize,
        width: usize,
        height: usize,
    },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GIF encoding failed: {0}")]
    Gif(#[from] image::ImageError),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error("frame {index} is {actual} bytes, expected {expected}")]
    FrameSize {
        index: usize,
        expected: usize,
        actual: usize,
    },
}
