use std::path::Path;

use crate::errors::{AppError, AppResult};
use crate::models::{Model, Page, PageQuery};
use crate::state::AppContext;

/// Onboard a model from a local video file
pub async fn add_model(ctx: &AppContext, model_name: &str, video_path: &Path) -> AppResult<i64> {
    let model_name = model_name.trim();
    if model_name.is_empty() {
        return Err(AppError::validation("Model name must not be empty"));
    }
    ctx.models.add_model(model_name, video_path).await
}

pub async fn page_models(ctx: &AppContext, query: PageQuery) -> AppResult<Page<Model>> {
    if query.page_size == 0 {
        return Err(AppError::validation("Page size must be positive"));
    }
    ctx.models.page(&query).await
}

pub async fn find_model(ctx: &AppContext, model_id: i64) -> AppResult<Model> {
    ctx.models.find(model_id).await
}

pub async fn count_models(ctx: &AppContext, name: &str) -> AppResult<u64> {
    ctx.models.count(name).await
}

pub async fn remove_model(ctx: &AppContext, model_id: i64) -> AppResult<()> {
    ctx.models.remove(model_id).await
}
