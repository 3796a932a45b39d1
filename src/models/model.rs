use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::AssetPaths;

/// Model row as persisted: asset paths are relative to their asset roots
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRow {
    pub id: i64,
    pub model_name: String,
    pub video_path: String,
    pub audio_path: String,
    pub voice_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewModel {
    pub model_name: String,
    pub video_path: String,
    pub audio_path: String,
    pub voice_id: Option<i64>,
}

/// Model as returned to callers, with absolute asset paths
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: i64,
    pub model_name: String,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub voice_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn from_row(row: ModelRow, assets: &AssetPaths) -> Self {
        Self {
            id: row.id,
            model_name: row.model_name,
            video_path: assets.model.join(&row.video_path),
            audio_path: assets.tts_root.join(&row.audio_path),
            voice_id: row.voice_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageQuery {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    /// Substring filter on the model name
    pub name: String,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            name: String::new(),
        }
    }
}

impl PageQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub list: Vec<T>,
}
