use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trained reference usable to synthesize speech in a cloned voice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceProfile {
    pub id: i64,
    /// Training audio, relative to the TTS root
    pub origin_audio_path: String,
    pub lang: String,
    /// Reference audio as the speech backend stores it
    pub asr_format_audio_url: String,
    /// Transcript of the reference audio
    pub reference_audio_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVoiceProfile {
    pub origin_audio_path: String,
    pub lang: String,
    pub asr_format_audio_url: String,
    pub reference_audio_text: String,
}
