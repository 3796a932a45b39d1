// Audio extraction module
// Derives the training audio track from an onboarded video

mod tools;

use async_trait::async_trait;
use std::path::Path;

use crate::errors::AppResult;

pub use tools::{parse_ffmpeg_version, FfmpegExtractor};

#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Write the audio track of `video_path` to `audio_path` as WAV
    async fn extract(&self, video_path: &Path, audio_path: &Path) -> AppResult<()>;
}
