use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("video download failed: {0}")]
    Download(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("nothing to archive: {0}")]
    ArchiveEmpty(String),

    #[error("{0} is already in progress")]
    Busy(&'static str),

    #[error("operation still running after {0:?}")]
    PollTimeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 decoding error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, StudioError>;
