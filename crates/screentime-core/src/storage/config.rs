//! TOML-based host configuration.
//!
//! Holds where the state document lives and how cloud sync behaves. Reward
//! settings are not here: they are part of the synced state document.
//!
//! Configuration is stored at `~/.config/screentime/config.toml`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::json_path::{get_json_value_by_path, set_json_value_by_path};

/// Relative path of the remote document inside a cloud folder.
pub const DEFAULT_REMOTE_PATH: &str = "Apps/ScreenTimeTracker/data.json";

/// Local state file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// File name (or absolute path) of the state document.
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

/// Cloud sync settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Quiet period after the last local change before pushing.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Root of a locally mounted cloud folder, for [`crate::sync::FolderCloudStore`].
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default = "default_remote_path")]
    pub remote_path: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/screentime/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

// Default functions
fn default_state_file() -> String {
    "state.json".into()
}
fn default_debounce_ms() -> u64 {
    2000
}
fn default_remote_path() -> String {
    DEFAULT_REMOTE_PATH.into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: default_debounce_ms(),
            folder: None,
            remote_path: default_remote_path(),
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.debounce_ms).unwrap_or(i64::MAX))
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory is unavailable, the file exists
    /// but cannot be parsed, or the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Resolved state document path. Relative names live in the data directory.
    pub fn state_path(&self) -> Result<PathBuf, ConfigError> {
        let file = Path::new(&self.storage.state_file);
        if file.is_absolute() {
            Ok(file.to_path_buf())
        } else {
            Ok(data_dir()?.join(file))
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Call [`Config::save`] to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        set_json_value_by_path(&mut json, key, value).map_err(invalid)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}
