//! Durable key-value storage port.
//!
//! Registry, stopwatches and credentials never touch the filesystem directly;
//! they receive a [`KeyValueStore`] so tests can substitute [`MemoryStore`].

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Key under which repository configurations are persisted.
pub const REPOSITORIES_KEY: &str = "repositories";

/// Key under which stopwatch states are persisted.
pub const STOPWATCHES_KEY: &str = "stopwatches";

/// Key under which a provider's bearer credential is persisted.
pub fn token_key(provider: &str) -> String {
    format!("{}-token", provider)
}

/// Whole-value key-value storage.
///
/// Writes overwrite the full value; no transactional semantics are implied.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value at `key`, or `None` when nothing is stored.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value at `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value at `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Load and decode a JSON value, treating missing or corrupt data as absent.
pub fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!("Ignoring corrupt value at key {}: {}", key, e);
            Ok(T::default())
        }
    }
}

/// Encode a value as JSON and overwrite `key` with it.
pub fn save_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value).map_err(|e| StorageError::Serialize {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, &json)
}

/// File-backed store keeping one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted in the user's data directory.
    pub fn in_default_location() -> Result<Self, StorageError> {
        let dir = dirs::data_dir()
            .ok_or_else(|| StorageError::Unavailable("no data directory".to_string()))?
            .join("reviewdesk");
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let bytes = match fs::read(self.key_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::ReadFailed {
                    key: key.to_string(),
                    message: e.to_string(),
                })
            }
        };

        match String::from_utf8(bytes) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable value at key {}: {}", key, e);
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let write_failed = |e: std::io::Error| StorageError::WriteFailed {
            key: key.to_string(),
            message: e.to_string(),
        };

        fs::create_dir_all(&self.dir).map_err(write_failed)?;
        fs::write(self.key_path(key), value).map_err(write_failed)?;

        tracing::debug!("Stored key {} in {:?}", key, self.dir);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFailed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// In-memory store, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}
