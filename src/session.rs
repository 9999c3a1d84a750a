//! Client-side persisted state.
//!
//! A flat string key-value store, the terminal counterpart of browser local
//! storage. Two entries are used: [`USER_KEY`] holds the serialised user
//! identity and [`TOKEN_KEY`] the raw authentication token. Both are
//! best-effort, unencrypted and never expire.
//!
//! The store module only describes *what* to persist; implementations of
//! [`SessionStorage`] decide *where*. [`FileSessionStorage`] writes a JSON map
//! to disk; [`MemorySessionStorage`] keeps it in memory for tests and for
//! embedding without a filesystem.

use crate::error::StorageError;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "token";

/// Key-value persistence for session entries.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// JSON file on disk, rewritten atomically on every mutation.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StorageError::Serde {
            path: self.path.clone(),
            source,
        })
    }

    /// Temp file in the same directory, then rename, so a crash never leaves
    /// a half-written session behind.
    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_vec_pretty(entries).map_err(|source| StorageError::Serde {
            path: self.path.clone(),
            source,
        })?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        debug!("Session saved to {}", self.path.display());
        Ok(())
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// In-memory storage. Clones share the same map, so a test can keep a handle
/// and inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_roundtrip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/session.json");
        let mut storage = FileSessionStorage::new(&path);

        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        storage.set(TOKEN_KEY, "abc").unwrap();
        storage.set(USER_KEY, r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        // A fresh handle sees what the first one wrote.
        let reopened = FileSessionStorage::new(&path);
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        storage.remove(TOKEN_KEY).unwrap();
        assert_eq!(reopened.get(TOKEN_KEY).unwrap(), None);
        assert!(reopened.get(USER_KEY).unwrap().is_some());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let err = FileSessionStorage::new(&path).get(USER_KEY).unwrap_err();
        assert!(matches!(err, StorageError::Serde { .. }));
    }

    #[test]
    fn memory_clones_share_state() {
        let probe = MemorySessionStorage::new();
        let mut writer = probe.clone();
        writer.set(TOKEN_KEY, "t").unwrap();
        assert_eq!(probe.snapshot().get(TOKEN_KEY).map(String::as_str), Some("t"));
        writer.remove(TOKEN_KEY).unwrap();
        assert!(probe.snapshot().is_empty());
    }
}
