//! Key-value persistence for favorites lists.
//!
//! This module provides:
//! - `KeyValueStore`: The persistence seam the favorites store writes through
//! - `JsonFileStore`: All partitions in one JSON document (state.json)
//! - `MemoryStore`: Shared in-memory map (tests only)

#[cfg(test)]
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::Arc;
use thiserror::Error;

use crate::entry::FavoriteEntry;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize favorites: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent key-value storage offered by the host
pub trait KeyValueStore {
    /// Read the list stored under `key`, `None` if nothing was ever stored
    fn get(&self, key: &str) -> StorageResult<Option<Vec<FavoriteEntry>>>;

    /// Replace the list stored under `key`
    fn set(&mut self, key: &str, entries: &[FavoriteEntry]) -> StorageResult<()>;
}

/// Contents of state.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
struct StateFile {
    partitions: BTreeMap<String, Vec<FavoriteEntry>>,
}

/// File-backed store keeping every partition in a single JSON document
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: StateFile,
}

impl JsonFileStore {
    /// Default state file path (state.json in local data directory)
    pub fn default_path() -> PathBuf {
        const FILENAME: &str = "state.json";
        if let Some(mut path) = dirs::data_local_dir() {
            path.push("favorites");
            path.push(FILENAME);
            return path;
        }

        // Fallback to home directory
        if let Some(mut path) = dirs::home_dir() {
            path.push(".favorites");
            path.push(FILENAME);
            return path;
        }

        PathBuf::from(FILENAME)
    }

    /// Open the store at `path`
    ///
    /// A missing or empty file opens as an empty store; a file that exists but
    /// cannot be parsed is an error.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => StateFile::default(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| StorageError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => StateFile::default(),
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        tracing::debug!(
            path = %path.display(),
            partitions = state.partitions.len(),
            "Opened favorites state file"
        );
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let content = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.path, content).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<FavoriteEntry>>> {
        Ok(self.state.partitions.get(key).cloned())
    }

    fn set(&mut self, key: &str, entries: &[FavoriteEntry]) -> StorageResult<()> {
        tracing::debug!(
            path = %self.path.display(),
            key,
            count = entries.len(),
            "Saving favorites partition"
        );
        self.state
            .partitions
            .insert(key.to_string(), entries.to_vec());
        self.flush()
    }
}

/// In-memory store; clones share the same map
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, Vec<FavoriteEntry>>>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<FavoriteEntry>>> {
        Ok(self.inner.read().get(key).cloned())
    }

    fn set(&mut self, key: &str, entries: &[FavoriteEntry]) -> StorageResult<()> {
        self.inner.write().insert(key.to_string(), entries.to_vec());
        Ok(())
    }
}
