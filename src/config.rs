//! Loader configuration.
//!
//! Read from a TOML file at startup. A stored file may omit any field; missing
//! fields are filled from the defaults by [`LoaderConfig::resolve`], once, so no
//! code downstream ever sees a partial configuration.

use crate::error::{LoadError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "maniaload.toml";

const DEFAULT_QUOTA_BYTES: u64 = 512 * 1024 * 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Complete loader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// SQLite file holding cached archives.
    pub database_path: PathBuf,
    /// Directory of `<setId>.osz` files used as the local archive source.
    pub songs_path: PathBuf,
    /// Space the archive cache may occupy on disk.
    pub quota_bytes: u64,
    /// Mirror URL template with an `{id}` placeholder. Enables remote fetches.
    pub mirror_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/archives.db"),
            songs_path: PathBuf::from("songs"),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            mirror_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Configuration as written on disk. Every field is optional so that files
/// written by older versions keep loading after new settings are added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub songs_path: Option<PathBuf>,
    #[serde(default)]
    pub quota_bytes: Option<u64>,
    #[serde(default)]
    pub mirror_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl LoaderConfig {
    /// Merges a stored configuration over the defaults, field by field.
    pub fn resolve(stored: StoredConfig, defaults: LoaderConfig) -> LoaderConfig {
        LoaderConfig {
            database_path: stored.database_path.unwrap_or(defaults.database_path),
            songs_path: stored.songs_path.unwrap_or(defaults.songs_path),
            quota_bytes: stored.quota_bytes.unwrap_or(defaults.quota_bytes),
            mirror_url: stored.mirror_url.or(defaults.mirror_url),
            request_timeout_secs: stored
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Parses TOML text and resolves it against the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let stored: StoredConfig =
            toml::from_str(content).map_err(|e| LoadError::Config(e.to_string()))?;
        Ok(Self::resolve(stored, LoaderConfig::default()))
    }

    /// Loads the configuration file, falling back to the defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(LoaderConfig::default());
        }
        let content = fs::read_to_string(path).map_err(|e| LoadError::Config(e.to_string()))?;
        match Self::from_toml_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                log::error!("Failed to parse TOML file {:?}: {}", path, e);
                Err(e)
            }
        }
    }

    /// Writes the full configuration back as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| LoadError::Config(e.to_string()))?;
            }
        }
        let content = toml::to_string_pretty(self).map_err(|e| LoadError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|e| LoadError::Config(e.to_string()))
    }
}
