// Speech backend module
// Voice training (preprocess + transcribe) and synthesis against the TTS tier

mod api;
mod models;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppResult;

pub use api::HttpSpeechBackend;
pub use models::{PreprocessRequest, PreprocessResponse, SynthesisRequest};

/// Trait that every speech backend must implement
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Preprocess and transcribe reference audio for a new voice profile
    async fn preprocess_and_transcribe(
        &self,
        request: &PreprocessRequest,
    ) -> AppResult<PreprocessResponse>;

    /// Synthesize speech, returning the encoded audio payload
    async fn synthesize(&self, request: &SynthesisRequest) -> AppResult<Bytes>;
}
