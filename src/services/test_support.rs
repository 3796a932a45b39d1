//! Fakes for the external collaborators, shared by service tests

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use super::audio::AudioExtractor;
use super::mirror::RemoteMirror;
use super::tts::{PreprocessRequest, PreprocessResponse, SpeechBackend, SynthesisRequest};
use super::voice::VoiceService;
use crate::config::{AssetPaths, ConfigStore, RemoteServerConfig};
use crate::db::SqliteRegistry;
use crate::errors::{AppError, AppResult};

pub const FAKE_WAV: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt ";

#[derive(Default)]
pub struct FakeBackend {
    pub fail_code: Option<i64>,
    pub preprocess_calls: Mutex<Vec<PreprocessRequest>>,
    pub synthesis_calls: Mutex<Vec<SynthesisRequest>>,
}

impl FakeBackend {
    pub fn failing(code: i64) -> Self {
        Self {
            fail_code: Some(code),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SpeechBackend for FakeBackend {
    async fn preprocess_and_transcribe(
        &self,
        request: &PreprocessRequest,
    ) -> AppResult<PreprocessResponse> {
        self.preprocess_calls.lock().unwrap().push(request.clone());
        Ok(match self.fail_code {
            Some(code) => PreprocessResponse {
                code,
                asr_format_audio_url: None,
                reference_audio_text: None,
                msg: Some("asr failed".to_string()),
            },
            None => PreprocessResponse {
                code: 0,
                asr_format_audio_url: Some(format!("/code/data/asr/{}", request.reference_audio)),
                reference_audio_text: Some("reference transcript".to_string()),
                msg: None,
            },
        })
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> AppResult<Bytes> {
        self.synthesis_calls.lock().unwrap().push(request.clone());
        Ok(Bytes::from_static(FAKE_WAV))
    }
}

/// Copies the video bytes to the audio path, or fails on demand
#[derive(Default)]
pub struct FakeExtractor {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn extract(&self, video_path: &Path, audio_path: &Path) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::upstream(
                "Failed to extract audio",
                anyhow::anyhow!("no audio stream"),
            ));
        }
        tokio::fs::copy(video_path, audio_path).await?;
        Ok(())
    }
}

pub struct Fixture {
    pub temp_dir: TempDir,
    pub assets: AssetPaths,
    pub registry: Arc<SqliteRegistry>,
    pub mirror: RemoteMirror,
}

impl Fixture {
    pub fn new(remote: RemoteServerConfig) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let assets = AssetPaths::from_data_root(&temp_dir.path().join("data"));
        let registry =
            Arc::new(SqliteRegistry::initialize(temp_dir.path().join("registry.sqlite3")).unwrap());
        let mirror = RemoteMirror::new(Arc::new(ConfigStore::in_memory(remote)));
        Self {
            temp_dir,
            assets,
            registry,
            mirror,
        }
    }

    pub fn local() -> Self {
        Self::new(RemoteServerConfig::default())
    }

    pub fn voice_service(&self, backend: Arc<FakeBackend>) -> VoiceService {
        VoiceService::new(
            self.assets.clone(),
            self.registry.clone(),
            backend,
            self.mirror.clone(),
        )
        .with_audition_dir(self.temp_dir.path().join("audition"))
    }

    /// Write an input file outside the asset roots
    pub fn input_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let dir = self.temp_dir.path().join("inputs");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}

/// Remote config pointing at a port nothing listens on
pub fn unreachable_remote() -> RemoteServerConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    remote_at(([127, 0, 0, 1], port).into())
}

pub fn remote_at(addr: SocketAddr) -> RemoteServerConfig {
    RemoteServerConfig {
        enabled: true,
        host: addr.ip().to_string(),
        file_server_port: addr.port(),
        timeout_secs: 5,
        ..RemoteServerConfig::default()
    }
}
