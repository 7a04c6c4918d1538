//! Record storage
//!
//! This module persists looked-up records as JSON documents, either in
//! memory or in a directory (optionally the system's standard cache
//! directory). The backend is chosen by an explicit [`DataSource`].

use crate::model::{ActorInfo, MovieInfo};
use parking_lot::RwLock;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to determine cache directory location
    #[error("Failed to determine cache directory location")]
    CacheDirectoryNotFound,

    /// Failed to create or access the store directory
    #[error("Failed to create store directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store directory does not exist or is not a directory
    #[error("Store directory {path} is not available")]
    Unavailable { path: PathBuf },

    /// Failed to read a stored record
    #[error("Failed to read record file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a record
    #[error("Failed to write record file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to deserialize a stored record
    #[error("Failed to deserialize record file {path}: {source}")]
    DeserializationFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to serialize a record
    #[error("Failed to serialize record: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// A data source string could not be understood
    #[error("Unknown data source {0:?}, expected memory, cache or dir:<path>")]
    UnknownDataSource(String),
}

/// Where records are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Records live only as long as the process
    #[default]
    Memory,
    /// JSON documents below the given directory
    Directory(PathBuf),
    /// JSON documents in the user's cache directory
    UserCache,
}

impl FromStr for DataSource {
    type Err = StoreError;

    /// Parses `memory`, `cache` or `dir:<path>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(DataSource::Memory),
            "cache" => Ok(DataSource::UserCache),
            _ => match s.strip_prefix("dir:") {
                Some(path) if !path.is_empty() => Ok(DataSource::Directory(PathBuf::from(path))),
                _ => Err(StoreError::UnknownDataSource(s.to_string())),
            },
        }
    }
}

enum Backend<T> {
    Memory(RwLock<HashMap<String, T>>),
    Directory(PathBuf),
}

/// A store for serializable records keyed by string.
pub struct RecordStore<T> {
    backend: Backend<T>,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Creates an empty in-memory store.
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a store backed by `dir`.
    ///
    /// The directory is not created until [`RecordStore::migrate`] runs.
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Directory(dir.into()),
        }
    }

    /// Prepares the backing storage.
    pub fn migrate(&self) -> Result<(), StoreError> {
        match &self.backend {
            Backend::Memory(_) => Ok(()),
            Backend::Directory(dir) => {
                fs::create_dir_all(dir).map_err(|e| StoreError::DirectoryCreationFailed {
                    path: dir.clone(),
                    source: e,
                })
            }
        }
    }

    /// Checks that the backing storage is reachable.
    pub fn ping(&self) -> Result<(), StoreError> {
        match &self.backend {
            Backend::Memory(_) => Ok(()),
            Backend::Directory(dir) if dir.is_dir() => Ok(()),
            Backend::Directory(dir) => Err(StoreError::Unavailable { path: dir.clone() }),
        }
    }

    /// Loads the record `provider` stored for `id`.
    ///
    /// # Returns
    ///
    /// `None` if nothing is stored for the pair. Returns an error if the
    /// record exists but cannot be read or deserialized.
    pub fn load(&self, provider: &str, id: &str) -> Result<Option<T>, StoreError> {
        let key = record_key(provider, id);
        match &self.backend {
            Backend::Memory(records) => Ok(records.read().get(&key).cloned()),
            Backend::Directory(dir) => {
                let file_path = record_path(dir, &key);

                // If file doesn't exist, return None
                if !file_path.exists() {
                    return Ok(None);
                }

                let content =
                    fs::read_to_string(&file_path).map_err(|e| StoreError::ReadFailed {
                        path: file_path.clone(),
                        source: e,
                    })?;

                let data = serde_json::from_str(&content).map_err(|e| {
                    StoreError::DeserializationFailed {
                        path: file_path,
                        source: e,
                    }
                })?;

                Ok(Some(data))
            }
        }
    }

    /// Stores `data` for `provider` and `id`, replacing any previous record.
    pub fn store(&self, provider: &str, id: &str, data: &T) -> Result<(), StoreError> {
        let key = record_key(provider, id);
        match &self.backend {
            Backend::Memory(records) => {
                records.write().insert(key, data.clone());
                Ok(())
            }
            Backend::Directory(dir) => {
                let file_path = record_path(dir, &key);
                let content = serde_json::to_string_pretty(data)?;

                fs::write(&file_path, content).map_err(|e| StoreError::WriteFailed {
                    path: file_path,
                    source: e,
                })
            }
        }
    }
}

fn record_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", key))
}

/// Storage for both record kinds.
pub struct Storage {
    movies: RecordStore<MovieInfo>,
    actors: RecordStore<ActorInfo>,
}

impl Storage {
    /// Opens the storage described by `source`.
    ///
    /// Opening never touches the file system; call [`Storage::migrate`] to
    /// create missing directories.
    pub fn open(source: &DataSource) -> Result<Self, StoreError> {
        match source {
            DataSource::Memory => Ok(Self {
                movies: RecordStore::memory(),
                actors: RecordStore::memory(),
            }),
            DataSource::Directory(root) => Ok(Self::in_directory(root)),
            DataSource::UserCache => {
                let proj_dirs = directories::ProjectDirs::from("", "", "metascrape")
                    .ok_or(StoreError::CacheDirectoryNotFound)?;
                Ok(Self::in_directory(&proj_dirs.cache_dir().join("records")))
            }
        }
    }

    fn in_directory(root: &Path) -> Self {
        Self {
            movies: RecordStore::directory(root.join("movies")),
            actors: RecordStore::directory(root.join("actors")),
        }
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        self.movies.migrate()?;
        self.actors.migrate()
    }

    pub fn ping(&self) -> Result<(), StoreError> {
        self.movies.ping()?;
        self.actors.ping()
    }

    pub fn load_movie_info(
        &self,
        provider: &str,
        id: &str,
    ) -> Result<Option<MovieInfo>, StoreError> {
        self.movies.load(provider, id)
    }

    pub fn save_movie_info(&self, info: &MovieInfo) -> Result<(), StoreError> {
        self.movies.store(&info.provider, &info.id, info)
    }

    pub fn load_actor_info(
        &self,
        provider: &str,
        id: &str,
    ) -> Result<Option<ActorInfo>, StoreError> {
        self.actors.load(provider, id)
    }

    pub fn save_actor_info(&self, info: &ActorInfo) -> Result<(), StoreError> {
        self.actors.store(&info.provider, &info.id, info)
    }
}

/// Everything except ASCII letters, digits and hyphens is escaped, so the
/// `_` joining the two parts of a key never appears inside either part.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-');

/// Builds the file-safe key of a record.
///
/// Provider names are matched case-insensitively, identifiers exactly.
/// Distinct pairs always produce distinct keys.
fn record_key(provider: &str, id: &str) -> String {
    format!(
        "{}_{}",
        utf8_percent_encode(&provider.to_lowercase(), KEY_ENCODE_SET),
        utf8_percent_encode(id, KEY_ENCODE_SET)
    )
}
