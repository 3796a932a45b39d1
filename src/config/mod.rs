// Configuration module
// Centralized management of application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod remote; // Remote mirror configuration

pub use remote::{ConfigStore, RemoteServerConfig};

const DATA_DIR_ENV: &str = "VOICE_ONBOARD_DATA_DIR";
const CONFIG_ENV: &str = "VOICE_ONBOARD_CONFIG";
const DB_PATH_ENV: &str = "VOICE_ONBOARD_DB_PATH";
const DEFAULT_DATA_DIR: &str = "~/voice_onboard_data";
const DEFAULT_DB_FILENAME: &str = "voice-onboard.sqlite3";

/// Fixed local roots for each category of asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetPaths {
    /// Copies of onboarded model videos
    pub model: PathBuf,
    /// Root that stored audio paths are relative to
    pub tts_root: PathBuf,
    /// Extracted training audio
    pub tts_train: PathBuf,
    /// Generated and copied product audio
    pub tts_product: PathBuf,
}

impl AssetPaths {
    pub fn from_data_root(data_root: &Path) -> Self {
        let tts_root = data_root.join("voice").join("data");
        Self {
            model: data_root.join("face2face").join("temp"),
            tts_train: tts_root.join("origin_audio"),
            tts_product: tts_root.join("temp"),
            tts_root,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_root: PathBuf,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub assets: AssetPaths,
}

impl AppConfig {
    /// Resolve paths from the environment, falling back to home-relative defaults
    pub fn from_env() -> Self {
        let data_root = env_path(DATA_DIR_ENV).unwrap_or_else(|| expand_home(DEFAULT_DATA_DIR));
        let config_path = env_path(CONFIG_ENV).unwrap_or_else(default_config_path);
        let db_path = env_path(DB_PATH_ENV).unwrap_or_else(|| data_root.join(DEFAULT_DB_FILENAME));
        Self::with_paths(data_root, config_path, db_path)
    }

    pub fn with_paths(data_root: PathBuf, config_path: PathBuf, db_path: PathBuf) -> Self {
        let assets = AssetPaths::from_data_root(&data_root);
        Self {
            data_root,
            config_path,
            db_path,
            assets,
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".voice-onboard")
        .join("server-config.json")
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(|raw| expand_home(&raw))
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_layout() {
        let assets = AssetPaths::from_data_root(Path::new("/data"));
        assert_eq!(assets.model, PathBuf::from("/data/face2face/temp"));
        assert_eq!(assets.tts_root, PathBuf::from("/data/voice/data"));
        assert_eq!(assets.tts_train, PathBuf::from("/data/voice/data/origin_audio"));
        assert_eq!(assets.tts_product, PathBuf::from("/data/voice/data/temp"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/code/data"), PathBuf::from("/code/data"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/voice"), home.join("voice"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
