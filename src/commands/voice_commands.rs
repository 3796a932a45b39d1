use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};
use crate::models::VoiceProfile;
use crate::state::AppContext;

const DEFAULT_LANG: &str = "zh";

/// Train a voice from audio relative to the TTS root; `None` if the backend rejected it
pub async fn train_voice(ctx: &AppContext, audio_path: &str, lang: Option<&str>) -> AppResult<Option<i64>> {
    ctx.voices
        .train(audio_path, lang.unwrap_or(DEFAULT_LANG))
        .await
}

pub async fn list_voices(ctx: &AppContext) -> AppResult<Vec<VoiceProfile>> {
    ctx.voices.list_voices().await
}

/// Synthesize a preview and return its absolute path
pub async fn audition(ctx: &AppContext, voice_id: i64, text: &str) -> AppResult<PathBuf> {
    if text.trim().is_empty() {
        return Err(AppError::validation("Text must not be empty"));
    }
    ctx.voices.audition(voice_id, text).await
}

/// Synthesize speech for a video, returning the product file name
pub async fn make_audio_for_video(ctx: &AppContext, voice_id: i64, text: &str) -> AppResult<String> {
    if text.trim().is_empty() {
        return Err(AppError::validation("Text must not be empty"));
    }
    ctx.voices.make_audio_for_video(voice_id, text).await
}

/// Copy existing audio into the product directory, returning the new file name
pub async fn copy_audio_for_video(ctx: &AppContext, file_path: &Path) -> AppResult<String> {
    ctx.voices.copy_audio_for_video(file_path).await
}
