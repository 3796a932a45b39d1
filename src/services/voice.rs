//! Voice profile training and speech generation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::mirror::{MirrorPolicy, RemoteMirror};
use super::tts::{PreprocessRequest, SpeechBackend, SynthesisRequest};
use crate::config::AssetPaths;
use crate::db::VoiceRegistry;
use crate::errors::{AppError, AppResult};
use crate::models::{NewVoiceProfile, ServiceType, VoiceProfile};
use crate::storage::assets;

#[derive(Debug, Clone)]
pub struct MakeAudioRequest {
    pub voice_id: i64,
    pub text: String,
    pub target_dir: PathBuf,
}

pub struct VoiceService {
    assets: AssetPaths,
    registry: Arc<dyn VoiceRegistry>,
    backend: Arc<dyn SpeechBackend>,
    mirror: RemoteMirror,
    audition_dir: PathBuf,
}

impl VoiceService {
    pub fn new(
        assets: AssetPaths,
        registry: Arc<dyn VoiceRegistry>,
        backend: Arc<dyn SpeechBackend>,
        mirror: RemoteMirror,
    ) -> Self {
        Self {
            assets,
            registry,
            backend,
            mirror,
            audition_dir: std::env::temp_dir(),
        }
    }

    /// Directory for preview audio; the OS temp dir by default
    pub fn with_audition_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audition_dir = dir.into();
        self
    }

    pub async fn list_voices(&self) -> AppResult<Vec<VoiceProfile>> {
        self.registry.select_all_voices().await
    }

    /// Train a voice profile from audio stored under the TTS root.
    ///
    /// `Ok(None)` means the backend rejected the sample; upload and transport
    /// failures are errors.
    pub async fn train(&self, audio_path: &str, lang: &str) -> AppResult<Option<i64>> {
        let audio_path = audio_path.replace('\\', "/");
        let local_path = self.assets.tts_root.join(&audio_path);

        let uploaded = self
            .mirror
            .mirror(
                &local_path,
                ServiceType::Tts,
                "origin_audio",
                MirrorPolicy::Fatal,
                "training audio file",
            )
            .await?;
        let reference_path = uploaded
            .map(|result| result.remote_path)
            .unwrap_or_else(|| audio_path.clone());

        let request = PreprocessRequest {
            format: audio_path
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .to_string(),
            reference_audio: base_name(&reference_path).to_string(),
            lang: lang.to_string(),
        };
        let response = self.backend.preprocess_and_transcribe(&request).await?;
        log::debug!("Preprocess response: {:?}", response);

        if response.code != 0 {
            log::warn!(
                "Voice training rejected for {} (code {}): {}",
                audio_path,
                response.code,
                response.msg.as_deref().unwrap_or("no message")
            );
            return Ok(None);
        }

        let (Some(asr_format_audio_url), Some(reference_audio_text)) =
            (response.asr_format_audio_url, response.reference_audio_text)
        else {
            log::warn!("Voice training for {} returned no reference data", audio_path);
            return Ok(None);
        };

        let id = self
            .registry
            .insert_voice(NewVoiceProfile {
                origin_audio_path: audio_path,
                lang: lang.to_string(),
                asr_format_audio_url,
                reference_audio_text,
            })
            .await?;

        Ok(Some(id))
    }

    /// Generate `<uuid>.wav` in `target_dir`, returning the file name only
    pub async fn make_audio(&self, request: MakeAudioRequest) -> AppResult<String> {
        let speaker = Uuid::new_v4().to_string();
        let voice = self
            .registry
            .select_voice(request.voice_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Voice {} not found", request.voice_id)))?;

        let synthesis = SynthesisRequest::for_voice(speaker.as_str(), request.text, &voice);
        let audio = self.backend.synthesize(&synthesis).await.map_err(|e| {
            log::error!("Error generating audio: {}", e);
            e
        })?;

        assets::ensure_dir(&request.target_dir).await?;
        let file_name = format!("{}.wav", speaker);
        tokio::fs::write(request.target_dir.join(&file_name), &audio).await?;

        Ok(file_name)
    }

    /// Generate audio for video production into the product directory
    pub async fn make_audio_for_video(&self, voice_id: i64, text: &str) -> AppResult<String> {
        self.make_audio(MakeAudioRequest {
            voice_id,
            text: text.to_string(),
            target_dir: self.assets.tts_product.clone(),
        })
        .await
    }

    /// Copy existing audio into the product directory under a timestamp name.
    ///
    /// The remote copy is detached: it may still be in flight when this
    /// returns, and its failure is only logged.
    pub async fn copy_audio_for_video(&self, file_path: &Path) -> AppResult<String> {
        if !assets::exists(file_path).await {
            return Err(AppError::not_found(format!(
                "Audio file does not exist: {}",
                file_path.display()
            )));
        }

        assets::ensure_dir(&self.assets.tts_product).await?;
        let file_name = assets::timestamp_file_name(file_path);
        let target_path = self.assets.tts_product.join(&file_name);
        assets::copy_file(file_path, &target_path).await?;

        self.mirror
            .mirror(
                &target_path,
                ServiceType::Tts,
                "products",
                MirrorPolicy::Detached,
                "copied audio file",
            )
            .await?;

        Ok(file_name)
    }

    /// Generate preview audio and return its absolute path
    pub async fn audition(&self, voice_id: i64, text: &str) -> AppResult<PathBuf> {
        let file_name = self
            .make_audio(MakeAudioRequest {
                voice_id,
                text: text.to_string(),
                target_dir: self.audition_dir.clone(),
            })
            .await?;
        Ok(self.audition_dir.join(file_name))
    }
}

/// Last path segment, accepting both separators
fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{unreachable_remote, FakeBackend, Fixture, FAKE_WAV};
    use std::time::Duration;

    async fn seed_training_audio(fixture: &Fixture, name: &str) -> String {
        assets::ensure_dir(&fixture.assets.tts_train).await.unwrap();
        std::fs::write(fixture.assets.tts_train.join(name), FAKE_WAV).unwrap();
        format!("origin_audio/{}", name)
    }

    #[tokio::test]
    async fn test_train_persists_profile() {
        let fixture = Fixture::local();
        let backend = Arc::new(FakeBackend::default());
        let service = fixture.voice_service(backend.clone());
        seed_training_audio(&fixture, "sample.wav").await;

        let id = service
            .train("origin_audio\\sample.wav", "zh")
            .await
            .unwrap()
            .expect("training should succeed");

        let calls = backend.preprocess_calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].format, "wav");
        assert_eq!(calls[0].reference_audio, "sample.wav");
        assert_eq!(calls[0].lang, "zh");

        let voices = service.list_voices().await.unwrap();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].id, id);
        assert_eq!(voices[0].origin_audio_path, "origin_audio/sample.wav");
        assert_eq!(voices[0].reference_audio_text, "reference transcript");
    }

    #[tokio::test]
    async fn test_rejected_training_is_none() {
        let fixture = Fixture::local();
        let service = fixture.voice_service(Arc::new(FakeBackend::failing(-1)));
        let audio = seed_training_audio(&fixture, "sample.wav").await;

        assert_eq!(service.train(&audio, "zh").await.unwrap(), None);
        assert!(service.list_voices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_train_upload_failure_is_fatal() {
        let fixture = Fixture::new(unreachable_remote());
        let backend = Arc::new(FakeBackend::default());
        let service = fixture.voice_service(backend.clone());
        let audio = seed_training_audio(&fixture, "sample.wav").await;

        let result = service.train(&audio, "zh").await;

        assert!(matches!(result, Err(AppError::Upstream { .. })));
        assert!(backend.preprocess_calls.lock().unwrap().is_empty());
        assert!(service.list_voices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_make_audio_writes_wav() {
        let fixture = Fixture::local();
        let backend = Arc::new(FakeBackend::default());
        let service = fixture.voice_service(backend.clone());
        let audio = seed_training_audio(&fixture, "sample.wav").await;
        let voice_id = service.train(&audio, "zh").await.unwrap().unwrap();

        let target_dir = fixture.temp_dir.path().join("out").join("nested");
        let file_name = service
            .make_audio(MakeAudioRequest {
                voice_id,
                text: "hello".to_string(),
                target_dir: target_dir.clone(),
            })
            .await
            .unwrap();

        assert!(file_name.ends_with(".wav"));
        assert!(!file_name.contains('/'));
        assert_eq!(std::fs::read(target_dir.join(&file_name)).unwrap(), FAKE_WAV);

        let calls = backend.synthesis_calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(format!("{}.wav", calls[0].speaker), file_name);
        assert_eq!(calls[0].text, "hello");
        assert_eq!(calls[0].reference_audio, "/code/data/asr/sample.wav");
        assert_eq!(calls[0].temperature, 0.7);
        assert_eq!(calls[0].repetition_penalty, 1.2);
    }

    #[tokio::test]
    async fn test_make_audio_for_video_writes_into_products() {
        let fixture = Fixture::local();
        let service = fixture.voice_service(Arc::new(FakeBackend::default()));
        let audio = seed_training_audio(&fixture, "sample.wav").await;
        let voice_id = service.train(&audio, "zh").await.unwrap().unwrap();

        let file_name = service.make_audio_for_video(voice_id, "narration").await.unwrap();

        assert!(file_name.ends_with(".wav"));
        assert_eq!(
            std::fs::read(fixture.assets.tts_product.join(&file_name)).unwrap(),
            FAKE_WAV
        );
    }

    #[tokio::test]
    async fn test_make_audio_unknown_voice() {
        let fixture = Fixture::local();
        let service = fixture.voice_service(Arc::new(FakeBackend::default()));

        let result = service
            .make_audio(MakeAudioRequest {
                voice_id: 42,
                text: "hello".to_string(),
                target_dir: fixture.temp_dir.path().join("out"),
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_audition_returns_absolute_path() {
        let fixture = Fixture::local();
        let service = fixture.voice_service(Arc::new(FakeBackend::default()));
        let audio = seed_training_audio(&fixture, "sample.wav").await;
        let voice_id = service.train(&audio, "zh").await.unwrap().unwrap();

        let path = service.audition(voice_id, "preview").await.unwrap();

        assert!(path.is_absolute());
        assert!(path.starts_with(fixture.temp_dir.path().join("audition")));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_copy_audio_ignores_mirror_failure() {
        let fixture = Fixture::new(unreachable_remote());
        let service = fixture.voice_service(Arc::new(FakeBackend::default()));
        let source = fixture.input_file("voice.mp3", b"ID3");

        let file_name = service.copy_audio_for_video(&source).await.unwrap();

        assert!(file_name.ends_with(".mp3"));
        assert_eq!(
            std::fs::read(fixture.assets.tts_product.join(&file_name)).unwrap(),
            b"ID3"
        );
    }

    #[tokio::test]
    async fn test_copy_audio_does_not_wait_for_upload() {
        // accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let mut remote = crate::services::test_support::remote_at(addr);
        remote.timeout_secs = 60;
        let fixture = Fixture::new(remote);
        let service = fixture.voice_service(Arc::new(FakeBackend::default()));
        let source = fixture.input_file("voice.wav", FAKE_WAV);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            service.copy_audio_for_video(&source),
        )
        .await
        .expect("copy must not wait for the remote upload");

        assert!(result.is_ok());
        hold.abort();
    }

    #[tokio::test]
    async fn test_copy_missing_audio() {
        let fixture = Fixture::local();
        let service = fixture.voice_service(Arc::new(FakeBackend::default()));

        let result = service
            .copy_audio_for_video(&fixture.temp_dir.path().join("missing.wav"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/code/data/origin_audio/a.wav"), "a.wav");
        assert_eq!(base_name("origin_audio\\b.wav"), "b.wav");
        assert_eq!(base_name("c.wav"), "c.wav");
    }
}
