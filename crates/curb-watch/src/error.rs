//! Watch session error types.

use thiserror::Error;

pub type WatchResult<T> = Result<T, WatchError>;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The commentary endpoint signaled a failed tick (non-2xx).
    #[error("Commentary tick failed with status {status}: {detail}")]
    TickFailed { status: u16, detail: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Frame source error: {0}")]
    FrameSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn frame_source(msg: impl Into<String>) -> Self {
        Self::FrameSource(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
