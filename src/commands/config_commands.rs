use serde_json::{json, Value};

use crate::config::RemoteServerConfig;
use crate::errors::AppResult;
use crate::state::AppContext;

/// Get the current remote server configuration
pub async fn get_server_config(ctx: &AppContext) -> AppResult<Value> {
    Ok(json!(ctx.remote.get()))
}

/// Merge `patch` into the remote server configuration and persist it
pub async fn set_server_config(ctx: &AppContext, patch: Value) -> AppResult<RemoteServerConfig> {
    let updated = ctx.remote.update(patch)?;
    log::debug!("Server config version is now {}", ctx.remote.version());
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn context(temp_dir: &tempfile::TempDir) -> AppContext {
        let root = temp_dir.path();
        AppContext::initialize(AppConfig::with_paths(
            root.join("data"),
            root.join("config").join("server-config.json"),
            root.join("data").join("registry.sqlite3"),
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_set_server_config_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(&temp_dir);

        let before = get_server_config(&ctx).await.unwrap();
        assert_eq!(before["enabled"], false);

        let updated = set_server_config(&ctx, json!({ "enabled": true, "host": "10.0.0.5" }))
            .await
            .unwrap();
        assert!(updated.enabled);
        assert_eq!(updated.file_server_url(), "http://10.0.0.5:3001");
        assert_eq!(ctx.remote.version(), 1);

        // a fresh context reads the persisted file
        let reloaded = context(&temp_dir);
        assert_eq!(get_server_config(&reloaded).await.unwrap()["host"], "10.0.0.5");
    }

    #[tokio::test]
    async fn test_set_server_config_rejects_non_object() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(&temp_dir);

        let result = set_server_config(&ctx, json!(["enabled"])).await;
        assert!(matches!(result, Err(crate::errors::AppError::Validation(_))));
        assert_eq!(ctx.remote.version(), 0);
    }
}
