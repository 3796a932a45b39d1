//! Model onboarding pipeline and model records

use std::path::Path;
use std::sync::Arc;

use super::audio::AudioExtractor;
use super::mirror::{MirrorPolicy, RemoteMirror};
use super::voice::VoiceService;
use crate::config::AssetPaths;
use crate::db::ModelRegistry;
use crate::errors::{AppError, AppResult};
use crate::models::{Model, NewModel, Page, PageQuery, ServiceType};
use crate::storage::assets;

const TRAINING_LANG: &str = "zh";

pub struct ModelService {
    assets: AssetPaths,
    registry: Arc<dyn ModelRegistry>,
    extractor: Arc<dyn AudioExtractor>,
    voices: Arc<VoiceService>,
    mirror: RemoteMirror,
}

impl ModelService {
    pub fn new(
        assets: AssetPaths,
        registry: Arc<dyn ModelRegistry>,
        extractor: Arc<dyn AudioExtractor>,
        voices: Arc<VoiceService>,
        mirror: RemoteMirror,
    ) -> Self {
        Self {
            assets,
            registry,
            extractor,
            voices,
            mirror,
        }
    }

    /// Onboard a model from `video_path` and return the new model id.
    ///
    /// Stages run in order: mirror video, copy video, extract audio, mirror
    /// audio, train voice, persist. Any stage error aborts the run and nothing
    /// already written (locally or remotely) is rolled back. A rejected voice
    /// training still persists the model, with no voice.
    pub async fn add_model(&self, model_name: &str, video_path: &Path) -> AppResult<i64> {
        if !assets::exists(video_path).await {
            return Err(AppError::not_found(format!(
                "Model video does not exist: {}",
                video_path.display()
            )));
        }

        assets::ensure_dir(&self.assets.model).await?;

        self.mirror
            .mirror(
                video_path,
                ServiceType::Face2Face,
                "models",
                MirrorPolicy::Fatal,
                "model video file",
            )
            .await?;

        let model_file_name = assets::timestamp_file_name(video_path);
        let model_path = self.assets.model.join(&model_file_name);
        assets::copy_file(video_path, &model_path).await?;

        assets::ensure_dir(&self.assets.tts_train).await?;
        let audio_file_name = Path::new(&model_file_name).with_extension("wav");
        let audio_path = self.assets.tts_train.join(audio_file_name);
        log::debug!("Extracting training audio for model '{}'", model_name);
        self.extractor.extract(&model_path, &audio_path).await?;

        self.mirror
            .mirror(
                &audio_path,
                ServiceType::Tts,
                "origin_audio",
                MirrorPolicy::Fatal,
                "model audio file",
            )
            .await?;

        let relative_audio_path = assets::relative_to(&audio_path, &self.assets.tts_root)?;
        let voice_id = self
            .voices
            .train(&relative_audio_path, TRAINING_LANG)
            .await?;
        if voice_id.is_none() {
            log::warn!("Voice training failed for model '{}', saving without voice", model_name);
        }

        let relative_video_path = assets::relative_to(&model_path, &self.assets.model)?;
        let id = self
            .registry
            .insert_model(NewModel {
                model_name: model_name.to_string(),
                video_path: relative_video_path,
                audio_path: relative_audio_path,
                voice_id,
            })
            .await?;

        log::info!("Model '{}' onboarded with id {}", model_name, id);
        Ok(id)
    }

    pub async fn page(&self, query: &PageQuery) -> AppResult<Page<Model>> {
        let total = self.registry.count_models(&query.name).await?;
        let list = self
            .registry
            .select_model_page(query)
            .await?
            .into_iter()
            .map(|row| Model::from_row(row, &self.assets))
            .collect();
        Ok(Page { total, list })
    }

    pub async fn find(&self, model_id: i64) -> AppResult<Model> {
        let row = self
            .registry
            .select_model(model_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Model {} not found", model_id)))?;
        Ok(Model::from_row(row, &self.assets))
    }

    pub async fn count(&self, name: &str) -> AppResult<u64> {
        self.registry.count_models(name).await
    }

    /// Delete the model's local files, then its row.
    ///
    /// The referenced voice profile and any remote copies are kept.
    pub async fn remove(&self, model_id: i64) -> AppResult<()> {
        let row = self
            .registry
            .select_model(model_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Model {} not found", model_id)))?;
        log::debug!("Removing model {}", model_id);

        if !row.video_path.is_empty() {
            assets::remove_if_exists(&self.assets.model.join(&row.video_path)).await?;
        }
        if !row.audio_path.is_empty() {
            assets::remove_if_exists(&self.assets.tts_root.join(&row.audio_path)).await?;
        }

        self.registry.remove_model(model_id).await?;
        Ok(())
    }
}
