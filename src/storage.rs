// Key-value blob storage backends

use crate::error::BlobError;
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable string storage addressed by key
pub trait BlobStorage {
    /// Read the blob under `key`, `None` if nothing was stored yet
    fn get(&self, key: &str) -> Result<Option<String>, BlobError>;

    /// Replace the blob under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<(), BlobError>;

    /// Remove the blob under `key`; removing a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<(), BlobError>;
}

fn validate_key(key: &str) -> Result<(), BlobError> {
    if key.is_empty() || key.len() > 64 {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    if !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}

// ============================================================================
// File-backed storage
// ============================================================================

/// One `{key}.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open or create storage rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BlobError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|source| BlobError::Io {
            key: base_path.display().to_string(),
            source,
        })?;

        debug!(path = ?base_path, "Opened file storage");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> BlobError + '_ {
        move |source| BlobError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl BlobStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        validate_key(key)?;

        let path = self.blob_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).map_err(Self::io_error(key))?;
        Ok(Some(raw))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), BlobError> {
        validate_key(key)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(".lock"))
            .map_err(Self::io_error(key))?;

        // Acquire exclusive lock before writing
        lock_file.lock_exclusive().map_err(Self::io_error(key))?;

        // Write to a temp file then rename over the blob
        let path = self.blob_path(key);
        let tmp = path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(Self::io_error(key))?;
        file.write_all(value.as_bytes()).map_err(Self::io_error(key))?;
        file.sync_all().map_err(Self::io_error(key))?;
        fs::rename(&tmp, &path).map_err(Self::io_error(key))?;

        debug!(key, bytes = value.len(), "Wrote blob");

        // Lock is automatically released when lock_file is dropped
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BlobError> {
        validate_key(key)?;

        let path = self.blob_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(Self::io_error(key))?;
        }
        Ok(())
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

/// Process-local storage, optionally limited to a total byte quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes pushing the total size past `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            blobs: HashMap::new(),
            quota: Some(quota),
        }
    }

    /// Total bytes currently stored
    pub fn used(&self) -> usize {
        self.blobs.values().map(String::len).sum()
    }
}

impl BlobStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        validate_key(key)?;
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), BlobError> {
        validate_key(key)?;

        if let Some(quota) = self.quota {
            let others = self.used() - self.blobs.get(key).map_or(0, String::len);
            let size = others + value.len();
            if size > quota {
                return Err(BlobError::QuotaExceeded {
                    key: key.to_string(),
                    size,
                    quota,
                });
            }
        }

        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), BlobError> {
        validate_key(key)?;
        self.blobs.remove(key);
        Ok(())
    }
}
