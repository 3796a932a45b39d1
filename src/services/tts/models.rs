use serde::{Deserialize, Serialize};

use crate::models::VoiceProfile;

/// Request to preprocess and transcribe reference audio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessRequest {
    /// Audio container, taken from the file extension
    pub format: String,

    /// File name of the reference audio as the backend sees it
    pub reference_audio: String,

    /// Language code (e.g., "zh", "en")
    pub lang: String,
}

/// Backend reply; `code` is zero on success
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessResponse {
    pub code: i64,

    #[serde(default)]
    pub asr_format_audio_url: Option<String>,

    #[serde(default)]
    pub reference_audio_text: Option<String>,

    #[serde(default)]
    pub msg: Option<String>,
}

/// Request to synthesize speech in a cloned voice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesisRequest {
    pub speaker: String,
    pub text: String,
    pub format: String,
    #[serde(rename = "topP")]
    pub top_p: f32,
    pub max_new_tokens: u32,
    pub chunk_length: u32,
    pub repetition_penalty: f32,
    pub temperature: f32,
    pub need_asr: bool,
    pub streaming: bool,
    pub is_fixed_seed: u8,
    pub is_norm: u8,
    pub reference_audio: String,
    pub reference_text: String,
}

impl SynthesisRequest {
    /// Decoding parameters are fixed; only speaker, text and the voice reference vary
    pub fn for_voice(speaker: impl Into<String>, text: impl Into<String>, voice: &VoiceProfile) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            format: "wav".to_string(),
            top_p: 0.7,
            max_new_tokens: 1024,
            chunk_length: 100,
            repetition_penalty: 1.2,
            temperature: 0.7,
            need_asr: false,
            streaming: false,
            is_fixed_seed: 0,
            is_norm: 0,
            reference_audio: voice.asr_format_audio_url.clone(),
            reference_text: voice.reference_audio_text.clone(),
        }
    }
}
