//! Inference error types.

use thiserror::Error;

pub type InferenceResult<T> = Result<T, InferenceError>;

/// Errors from the vision and embedding boundaries.
///
/// Everything except `Config` is transient from the retry policy's point of
/// view: a malformed body and a refused connection are treated identically.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl InferenceError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
