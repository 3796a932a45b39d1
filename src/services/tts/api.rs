use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use super::models::{PreprocessRequest, PreprocessResponse, SynthesisRequest};
use super::SpeechBackend;
use crate::config::ConfigStore;
use crate::errors::{AppError, AppResult};
use crate::utils::http::{error_text, HTTP_CLIENT};

/// Speech backend reached over HTTP at the configured TTS endpoint
#[derive(Clone)]
pub struct HttpSpeechBackend {
    config: Arc<ConfigStore>,
}

impl HttpSpeechBackend {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self { config }
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> AppResult<reqwest::Response> {
        let config = self.config.get();
        let url = format!("{}{}", config.tts_url(), path);

        let response = HTTP_CLIENT
            .post(&url)
            .timeout(Duration::from_secs(config.timeout_secs))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Speech backend request to {} failed", url), e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_text(response).await;
            return Err(AppError::upstream(
                "Speech backend request failed",
                anyhow!("status {}: {}", status, error_text),
            ));
        }

        Ok(response)
    }
}

#[async_trait]
impl SpeechBackend for HttpSpeechBackend {
    async fn preprocess_and_transcribe(
        &self,
        request: &PreprocessRequest,
    ) -> AppResult<PreprocessResponse> {
        let response = self.post("/v1/preprocess_and_tran", request).await?;
        response
            .json::<PreprocessResponse>()
            .await
            .map_err(|e| AppError::upstream("Failed to parse preprocess response", e))
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> AppResult<Bytes> {
        let response = self.post("/v1/invoke", request).await?;
        response
            .bytes()
            .await
            .map_err(|e| AppError::upstream("Failed to read synthesized audio", e))
    }
}
