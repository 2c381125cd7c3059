//! Sampled video frames.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on an encoded frame, matching the API body limit.
pub const MAX_FRAME_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame data is empty")]
    Empty,

    #[error("frame data is not a data URL")]
    NotADataUrl,

    #[error("frame data exceeds the size bound ({0} bytes)")]
    TooLarge(usize),

    #[error("frame has zero dimensions ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },
}

/// A single still image read from the playback surface.
///
/// The encoding is opaque to the pipeline — a base64 raster data URL is all
/// the vision endpoint needs. No decoding happens on this side.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EncodedFrame {
    /// Base64 data URL (e.g. `data:image/jpeg;base64,...`).
    pub data_url: String,
    /// Source width in pixels.
    pub width: u32,
    /// Source height in pixels.
    pub height: u32,
}

impl EncodedFrame {
    pub fn new(data_url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            data_url: data_url.into(),
            width,
            height,
        }
    }

    /// Validate the frame before submitting it to the inference boundary.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.data_url.is_empty() {
            return Err(FrameError::Empty);
        }
        if !self.data_url.starts_with("data:") {
            return Err(FrameError::NotADataUrl);
        }
        if self.data_url.len() > MAX_FRAME_BYTES {
            return Err(FrameError::TooLarge(self.data_url.len()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::ZeroDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_data_url() {
        let frame = EncodedFrame::new("data:image/jpeg;base64,/9j/4AAQ", 640, 480);
        assert!(frame.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_frames() {
        assert!(matches!(
            EncodedFrame::new("", 640, 480).validate(),
            Err(FrameError::Empty)
        ));
        assert!(matches!(
            EncodedFrame::new("http://example.com/f.jpg", 640, 480).validate(),
            Err(FrameError::NotADataUrl)
        ));
        assert!(matches!(
            EncodedFrame::new("data:image/jpeg;base64,AA", 0, 480).validate(),
            Err(FrameError::ZeroDimensions { .. })
        ));
    }
}
