use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::errors::{AppError, AppResult};

/// Settings for the remote storage/processing tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteServerConfig {
    /// Mirror assets to the remote tier
    pub enabled: bool,

    /// Host running the remote file gateway and speech backend
    pub host: String,

    pub file_server_port: u16,

    pub tts_port: u16,

    /// Timeout for every request against the remote tier
    pub timeout_secs: u64,
}

impl Default for RemoteServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            file_server_port: 3001,
            tts_port: 18180,
            timeout_secs: 300,
        }
    }
}

impl RemoteServerConfig {
    pub fn file_server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.file_server_port)
    }

    pub fn tts_url(&self) -> String {
        format!("http://{}:{}", self.host, self.tts_port)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.timeout_secs == 0 {
            return Err(AppError::validation("timeoutSecs must be positive"));
        }
        if self.host.trim().is_empty() {
            return Err(AppError::validation("host must not be empty"));
        }
        Ok(())
    }
}

/// Persistent, shared remote server configuration.
///
/// Readers get snapshots; updates are merged patches that are written to disk
/// before they become visible. `version` counts successful updates.
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<RemoteServerConfig>,
    version: AtomicU64,
}

impl ConfigStore {
    /// Load the configuration file, creating it with defaults if it is missing
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();

        let config = if path.exists() {
            match fs::read_to_string(&path)
                .map_err(AppError::from)
                .and_then(|json| serde_json::from_str::<RemoteServerConfig>(&json).map_err(AppError::from))
                .and_then(|config| config.validate().map(|_| config))
            {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Failed to read server config {}: {}", path.display(), e);
                    RemoteServerConfig::default()
                }
            }
        } else {
            let config = RemoteServerConfig::default();
            save_config(&path, &config)?;
            config
        };

        Ok(Self {
            path,
            current: RwLock::new(config),
            version: AtomicU64::new(0),
        })
    }

    /// Store that is never written to disk
    pub fn in_memory(config: RemoteServerConfig) -> Self {
        Self {
            path: PathBuf::new(),
            current: RwLock::new(config),
            version: AtomicU64::new(0),
        }
    }

    pub fn get(&self) -> RemoteServerConfig {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_mirror_enabled(&self) -> bool {
        self.get().enabled
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Merge `patch` over the current configuration and persist the result
    pub fn update(&self, patch: Value) -> AppResult<RemoteServerConfig> {
        let Value::Object(patch) = patch else {
            return Err(AppError::validation("Config patch must be a JSON object"));
        };

        let mut guard = self.current.write().map_err(|e| {
            AppError::Configuration(format!("Failed to acquire lock for server config: {}", e))
        })?;

        let mut merged = serde_json::to_value(&*guard)?;
        if let Value::Object(fields) = &mut merged {
            fields.extend(patch);
        }
        let updated: RemoteServerConfig = serde_json::from_value(merged)
            .map_err(|e| AppError::validation(format!("Invalid config patch: {}", e)))?;
        updated.validate()?;

        if !self.path.as_os_str().is_empty() {
            save_config(&self.path, &updated)?;
        }

        *guard = updated.clone();
        self.version.fetch_add(1, Ordering::SeqCst);
        log::info!("Server config updated (mirror enabled: {})", updated.enabled);

        Ok(updated)
    }
}

fn save_config(path: &Path, config: &RemoteServerConfig) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}
