//! Persistence boundary.
//!
//! The manager persists installed sources, artifacts, identities, favorites
//! and remembered sessions through a [`KeyValueStore`]. Keys are `/`-separated
//! paths such as `sessions/mangadex`.
//!
//! [`FileStore`] keeps one file per key:
//! ```text
//! <data dir>/
//! ├── sources
//! ├── identities
//! ├── favorites
//! ├── artifacts/
//! │   └── local
//! └── sessions/
//!     └── mangadex
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::sync::lock;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to create the storage directory.
    #[error("failed to create storage directory: {path}")]
    StorageCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key cannot be mapped to a storage location.
    #[error("invalid store key: {key}")]
    InvalidKey { key: String },

    /// Reading, writing or deleting a value failed.
    #[error("store IO failed for {key}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored value could not be decoded.
    #[error("corrupt value for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A value could not be encoded.
    #[error("failed to encode value for {key}: {reason}")]
    Encode { key: String, reason: String },
}

/// Key-based get/put/delete storage.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the value cannot be read.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the value cannot be written.
    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Deletes the value under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the value cannot be deleted.
    fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Loads and decodes a JSON value.
pub(crate) fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> StoreResult<Option<T>> {
    store
        .get(key)?
        .map(|bytes| {
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Encodes and stores a JSON value.
pub(crate) fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.put(key, &bytes)
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = lock(&self.values).keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        lock(&self.values).insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// Store keeping one file per key under a base directory.
#[derive(Debug)]
pub struct FileStore {
    base_dir: PathBuf,
    temp_counter: AtomicU64,
}

impl FileStore {
    /// Creates a store rooted at `base_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_dir = base_dir.into();

        std::fs::create_dir_all(&base_dir).map_err(|source| StoreError::StorageCreation {
            path: base_dir.clone(),
            source,
        })?;

        Ok(Self {
            base_dir,
            temp_counter: AtomicU64::new(0),
        })
    }

    /// Returns the base directory path.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Maps a key to its file path.
    ///
    /// # Errors
    ///
    /// Returns an error if a key segment is empty, `.` or `..`, or contains
    /// characters other than ASCII alphanumerics, `-`, `_` and `.`.
    pub fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key.split('/').all(|segment| {
                !segment.is_empty()
                    && segment != "."
                    && segment != ".."
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            });

        if !valid {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
            });
        }

        Ok(key
            .split('/')
            .fold(self.base_dir.clone(), |path, segment| path.join(segment)))
    }

    fn io_error(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.path_for(key)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::StorageCreation {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Write to a unique temp file, then rename over the target
        let counter = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let mut temp = path.clone().into_os_string();
        temp.push(format!(".{}.{counter}.tmp", std::process::id()));
        let temp = PathBuf::from(temp);

        std::fs::write(&temp, value).map_err(|e| Self::io_error(key, e))?;
        if let Err(e) = std::fs::rename(&temp, &path) {
            let _ = std::fs::remove_file(&temp);
            return Err(Self::io_error(key, e));
        }

        tracing::debug!(key, path = %path.display(), "stored value");
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(key, path = %path.display(), "deleted value");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("favorites").unwrap(), None);

        store.put("favorites", b"[1,2]").unwrap();
        assert_eq!(store.get("favorites").unwrap(), Some(b"[1,2]".to_vec()));

        store.delete("favorites").unwrap();
        store.delete("favorites").unwrap();
        assert_eq!(store.get("favorites").unwrap(), None);
    }

    #[test]
    fn test_file_store_nested_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("data")).unwrap();

        store.put("sessions/mangadex", b"token").unwrap();
        assert!(temp_dir.path().join("data/sessions/mangadex").exists());
        assert_eq!(
            store.get("sessions/mangadex").unwrap(),
            Some(b"token".to_vec())
        );

        store.put("sessions/mangadex", b"newer").unwrap();
        assert_eq!(
            store.get("sessions/mangadex").unwrap(),
            Some(b"newer".to_vec())
        );

        store.delete("sessions/mangadex").unwrap();
        assert_eq!(store.get("sessions/mangadex").unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();
        assert_eq!(store.get("identities").unwrap(), None);
        assert!(store.delete("identities").is_ok());
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();
        store.put("favorites", b"[]").unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["favorites"]);
    }

    #[test]
    fn test_file_store_rejects_escaping_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        for key in ["", "../etc/passwd", "sessions//x", "a/./b", "with space", "/abs"] {
            assert!(
                matches!(store.put(key, b"x"), Err(StoreError::InvalidKey { .. })),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        save_json(&store, "favorites", &vec![3_u64, 5]).unwrap();
        let loaded: Option<Vec<u64>> = load_json(&store, "favorites").unwrap();
        assert_eq!(loaded, Some(vec![3, 5]));

        store.put("favorites", b"not json").unwrap();
        let corrupt: StoreResult<Option<Vec<u64>>> = load_json(&store, "favorites");
        assert!(matches!(corrupt, Err(StoreError::Corrupt { .. })));
    }
}
