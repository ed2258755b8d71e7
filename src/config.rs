//! Kiosk configuration loaded from a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{remote::HostContact, remote::http::RemoteConfig, runtime::handle::RuntimeConfig};

/// Failure to read or parse a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("reading {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level kiosk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// SQLite database holding the visit store.
    pub database_path: PathBuf,
    /// Hosted system of record; local-only when absent.
    pub remote: Option<RemoteConfig>,
    /// Hosts that can be notified on check-in.
    pub hosts: Vec<HostContact>,
    /// Runtime queue and notification settings.
    pub runtime: RuntimeConfig,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("visitlog.db"),
            remote: None,
            hosts: Vec::new(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl KioskConfig {
    /// Parses configuration JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
