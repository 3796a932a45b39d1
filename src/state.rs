//! Shared application state wired once at startup

use std::sync::Arc;

use crate::config::{AppConfig, ConfigStore};
use crate::db::SqliteRegistry;
use crate::errors::AppResult;
use crate::services::audio::FfmpegExtractor;
use crate::services::tts::HttpSpeechBackend;
use crate::services::{ModelService, RemoteMirror, VoiceService};
use crate::storage::{PathRouter, ServiceRoots};

#[derive(Clone)]
pub struct AppContext {
    pub remote: Arc<ConfigStore>,
    pub models: Arc<ModelService>,
    pub voices: Arc<VoiceService>,
    pub mirror: RemoteMirror,
    pub paths: PathRouter,
}

impl AppContext {
    pub fn initialize(config: AppConfig) -> AppResult<Self> {
        log::debug!("Data root: {}", config.data_root.display());

        let remote = Arc::new(ConfigStore::load(&config.config_path)?);
        let registry = Arc::new(SqliteRegistry::initialize(&config.db_path)?);
        let mirror = RemoteMirror::new(remote.clone());

        let voices = Arc::new(VoiceService::new(
            config.assets.clone(),
            registry.clone(),
            Arc::new(HttpSpeechBackend::new(remote.clone())),
            mirror.clone(),
        ));
        let models = Arc::new(ModelService::new(
            config.assets.clone(),
            registry,
            Arc::new(FfmpegExtractor::new()),
            voices.clone(),
            mirror.clone(),
        ));
        let paths = PathRouter::new(ServiceRoots::from_data_root(&config.data_root));

        if remote.is_mirror_enabled() {
            log::info!("Mirroring assets to {}", remote.get().file_server_url());
        }

        Ok(Self {
            remote,
            models,
            voices,
            mirror,
            paths,
        })
    }
}
