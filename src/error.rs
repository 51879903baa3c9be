use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading, analysing or rendering a signal.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV read failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("FLAC read failed: {0}")]
    Flac(#[from] claxon::Error),

    #[error("decode failed for {path:?}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("scene serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not display {path:?}: {reason}")]
    Display { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
