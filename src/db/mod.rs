// Persistence module
// Registries for onboarded models and trained voice profiles

mod sqlite;

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{ModelRow, NewModel, NewVoiceProfile, PageQuery, VoiceProfile};

pub use sqlite::SqliteRegistry;

#[async_trait]
pub trait ModelRegistry: Send + Sync {
    async fn insert_model(&self, model: NewModel) -> AppResult<i64>;

    async fn select_model_page(&self, query: &PageQuery) -> AppResult<Vec<ModelRow>>;

    /// Number of models whose name contains `name`
    async fn count_models(&self, name: &str) -> AppResult<u64>;

    async fn select_model(&self, id: i64) -> AppResult<Option<ModelRow>>;

    /// Returns whether a row was deleted
    async fn remove_model(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait VoiceRegistry: Send + Sync {
    async fn insert_voice(&self, voice: NewVoiceProfile) -> AppResult<i64>;

    async fn select_voice(&self, id: i64) -> AppResult<Option<VoiceProfile>>;

    async fn select_all_voices(&self) -> AppResult<Vec<VoiceProfile>>;
}
