// Configuration loaded from YAML with built-in defaults

use crate::error::ConfigError;
use crate::timer::DEFAULT_SESSION_SECS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Where tasks are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    File,
    /// Nothing survives the process
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the task blob; platform data dir when unset
    pub data_dir: Option<PathBuf>,
    pub session_seconds: u64,
    pub tick_millis: u64,
    pub storage: StorageKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            session_seconds: DEFAULT_SESSION_SECS,
            tick_millis: 1000,
            storage: StorageKind::File,
        }
    }
}

impl Config {
    /// `<config_dir>/taskquest/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskquest").join("config.yaml"))
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config = if raw.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };

        config.validate()?;
        debug!(path = ?path, ?config, "Loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_millis == 0 {
            return Err(ConfigError::Invalid("tick_millis must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Resolved blob directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("taskquest")))
            .unwrap_or_else(|| PathBuf::from(".taskquest"))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}
