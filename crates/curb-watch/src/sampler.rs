//! Frame sampling.
//!
//! The sampler reads one already-rendered still per tick — no decoding or
//! codec work happens here. The production surface is a directory of frames
//! exported from the video, cycled in order to simulate playback.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use curb_models::EncodedFrame;

use crate::error::{WatchError, WatchResult};

/// Source of sampled frames. `grab` is synchronous and cheap — it reads a
/// rendered still off the presentation surface.
pub trait FrameSource: Send + 'static {
    fn grab(&mut self) -> WatchResult<EncodedFrame>;
}

/// Reads pre-rendered frames from a directory, looping forever.
#[derive(Debug)]
pub struct DirectoryFrameSource {
    frames: Vec<PathBuf>,
    cursor: usize,
    width: u32,
    height: u32,
}

impl DirectoryFrameSource {
    /// Scan a directory for frame images (jpg/jpeg/png), sorted by name.
    pub fn new(dir: impl AsRef<Path>, width: u32, height: u32) -> WatchResult<Self> {
        let dir = dir.as_ref();
        let mut frames: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("jpg") | Some("jpeg") | Some("png")
                )
            })
            .collect();
        frames.sort();

        if frames.is_empty() {
            return Err(WatchError::frame_source(format!(
                "no frames found in {}",
                dir.display()
            )));
        }

        Ok(Self {
            frames,
            cursor: 0,
            width,
            height,
        })
    }
}

impl FrameSource for DirectoryFrameSource {
    fn grab(&mut self) -> WatchResult<EncodedFrame> {
        let path = &self.frames[self.cursor];
        self.cursor = (self.cursor + 1) % self.frames.len();

        let bytes = fs::read(path)?;
        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some("png") => "image/png",
            _ => "image/jpeg",
        };
        let data_url = format!("data:{};base64,{}", mime, BASE64.encode(&bytes));

        Ok(EncodedFrame::new(data_url, self.width, self.height))
    }
}
