//! Durable key/value slots backing the session.
//!
//! Writes always go through [`SessionStorage::store`] or
//! [`SessionStorage::remove`] with every slot of a change at once, so a
//! reader never observes a token without its user or the reverse.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Errors that can occur while reading or writing session slots.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The slot file is not a JSON object of strings.
    #[error("Corrupt session file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key/value slots that survive a restart.
pub trait SessionStorage: Send + Sync {
    /// Read one slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write several slots in one step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written; in that
    /// case none of the slots changed.
    fn store(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove several slots in one step.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, keys: &[&str]) -> Result<(), StorageError>;
}

// =============================================================================
// File storage
// =============================================================================

/// Slots kept as one JSON object in a file.
///
/// Every write replaces the file through a temporary sibling and a rename,
/// which is atomic on the same filesystem.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStorage {
    /// File name used inside the state directory.
    pub const FILE_NAME: &'static str = "session.json";

    /// Storage at `dir/session.json`. The directory is created on first write.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::at(dir.join(Self::FILE_NAME))
    }

    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, slots: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(slots).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }

    /// Read-modify-write under the process-local lock.
    ///
    /// A corrupt file is treated as empty so that logout can always clear it.
    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut slots = match self.read_all() {
            Ok(slots) => slots,
            Err(StorageError::Corrupt { .. }) => {
                tracing::warn!(path = %self.path.display(), "Discarding corrupt session file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        f(&mut slots);
        self.write_all(&slots)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn store(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|slots| {
            for (key, value) in entries {
                slots.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|slots| {
            for key in keys {
                slots.remove(*key);
            }
        })
    }
}

// =============================================================================
// Memory storage
// =============================================================================

/// Slots held in memory, for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn store(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            slots.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            slots.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sportgear-storage-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = temp_dir();
        let storage = FileStorage::in_dir(&dir);
        assert_eq!(storage.get("authToken").unwrap(), None);

        storage
            .store(&[("authToken", "t-1"), ("user", r#"{"email":"a@b.co"}"#)])
            .unwrap();
        assert_eq!(storage.get("authToken").unwrap().as_deref(), Some("t-1"));

        let reopened = FileStorage::in_dir(&dir);
        assert_eq!(
            reopened.get("user").unwrap().as_deref(),
            Some(r#"{"email":"a@b.co"}"#)
        );

        reopened.remove(&["authToken", "user"]).unwrap();
        assert_eq!(storage.get("authToken").unwrap(), None);
        assert_eq!(storage.get("user").unwrap(), None);
        assert!(!storage.path().with_extension("json.tmp").exists());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_reported_then_cleared() {
        let dir = temp_dir();
        fs::create_dir_all(&dir).unwrap();
        let storage = FileStorage::in_dir(&dir);
        fs::write(storage.path(), "not json").unwrap();

        assert!(matches!(
            storage.get("authToken"),
            Err(StorageError::Corrupt { .. })
        ));

        storage.remove(&["authToken", "user"]).unwrap();
        assert_eq!(storage.get("authToken").unwrap(), None);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.store(&[("a", "1"), ("b", "2")]).unwrap();
        storage.remove(&["a"]).unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
    }
}
