//! Server configuration and secrets loading.
//!
//! `AppConfig` comes from an optional `config.json`; every field has a default so
//! a missing file or a partial one is fine. The completion API key lives apart
//! from it in `secrets.json` (or the `OPENAI_API_KEY` environment variable) and is
//! handed to the completion client explicitly.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const API_KEY_NAME: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no OPENAI_API_KEY in secrets file or environment")]
    MissingApiKey,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Root under which `models/`, `labels/`, `scripts/` and `output/` live.
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub completion_base_url: String,
    pub completion_model: String,
    /// `None` means the completion call blocks until the server answers.
    pub request_timeout_secs: Option<u64>,
    /// External 3D tool command line, e.g. `blender` or
    /// `flatpak run org.blender.Blender`. When unset, scripts are generated but never run.
    pub tool_command: Option<String>,
    /// Age after which staged and generated files are swept. 0 disables.
    pub retention_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            data_dir: PathBuf::from("."),
            log_dir: PathBuf::from("logs"),
            completion_base_url: "https://api.openai.com/v1".to_string(),
            completion_model: "gpt-4".to_string(),
            request_timeout_secs: None,
            tool_command: None,
            retention_ttl_secs: 24 * 60 * 60,
            sweep_interval_secs: 60 * 60,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn retention_ttl(&self) -> Option<Duration> {
        (self.retention_ttl_secs > 0).then(|| Duration::from_secs(self.retention_ttl_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

/// Completion API credential. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Read the API key from a flat JSON secrets file, falling back to the environment.
pub fn load_api_key(secrets_path: &Path) -> Result<ApiKey, ConfigError> {
    if secrets_path.exists() {
        let raw = std::fs::read_to_string(secrets_path).map_err(|source| ConfigError::Io {
            path: secrets_path.to_path_buf(),
            source,
        })?;
        let secrets: HashMap<String, String> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: secrets_path.to_path_buf(),
                source,
            })?;
        if let Some(key) = secrets.get(API_KEY_NAME).filter(|k| !k.trim().is_empty()) {
            return Ok(ApiKey::new(key.trim()));
        }
    }

    match std::env::var(API_KEY_NAME) {
        Ok(key) if !key.trim().is_empty() => Ok(ApiKey::new(key.trim())),
        _ => Err(ConfigError::MissingApiKey),
    }
}
