//! Media-utility errors (spec §4.3/§4.8).

use std::path::PathBuf;

use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("ffprobe not found on PATH")]
    FfprobeNotFound,

    #[error("ffmpeg not found on PATH")]
    FfmpegNotFound,

    #[error("ffprobe failed: {message}{}", stderr.as_deref().map(|s| format!(" ({s})")).unwrap_or_default())]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("ffmpeg failed: {message}{}", stderr.as_deref().map(|s| format!(" ({s})")).unwrap_or_default())]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("invalid video: {0}")]
    InvalidVideo(String),

    #[error("screencast invoker exited non-zero: {0}")]
    ScreencastFailed(String),

    #[error("image compositing failed: {0}")]
    ImageError(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MediaError {
    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }
}

impl From<image::ImageError> for MediaError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}
