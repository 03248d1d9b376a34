// Error types for the storage and configuration layers

use std::path::PathBuf;
use thiserror::Error;

/// Failures reading, writing or decoding a storage blob.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Underlying file operation failed.
    #[error("Blob I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored payload is not a valid collection.
    #[error("Malformed blob: {0}")]
    Json(#[from] serde_json::Error),

    /// Write would exceed the storage quota.
    #[error("Storage quota exceeded writing {key}: {size} bytes (quota {quota})")]
    QuotaExceeded { key: String, size: usize, quota: usize },

    /// Key is empty, too long or contains unsupported characters.
    #[error("Invalid storage key: {0:?} (must be 1-64 ASCII alphanumeric chars with _/-)")]
    InvalidKey(String),
}

/// Failures loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value parsed but cannot be used.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}
