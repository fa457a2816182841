//! Persisted key-value state, the local-storage analogue.
//!
//! Values are opaque strings; callers serialise their own records. Two
//! backends exist: [`MemoryStore`] for ephemeral use and tests, and
//! [`FileStore`], which keeps every key in one JSON object on disk.

use std::collections::BTreeMap;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Mutex,
    MutexGuard,
    PoisonError,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String values addressed by key.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Acquires a std mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Stored entries
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// All keys in a single JSON object file.
///
/// Writes go to a sibling temp file that is renamed over the original, so a
/// reader never observes a half-written file.
///
/// Every call does blocking `std::fs` I/O on the calling thread, since
/// [`KeyValueStore`] is synchronous. The file holds a handful of small
/// entries, so async callers use it inline; bulk work from a runtime
/// belongs in `tokio::task::spawn_blocking`.
#[derive(Debug)]
pub struct FileStore {
    /// Backing file
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole map. A missing file is empty; an unreadable JSON body
    /// is logged and treated as empty so one corrupt write cannot wedge the
    /// client.
    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => return Err(StorageError::Io { path: self.path.clone(), source }),
        };

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "Storage file is corrupt, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let serialized = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, serialized).map_err(io_err)?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_err)?;
        Ok(())
    }

    /// Applies `change` to the stored map under the write lock.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let _guard = lock(&self.write_lock);
        let mut entries = self.read_all()?;
        if change(&mut entries) {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use googletest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn file_store(dir: &TempDir) -> FileStore {
        FileStore::new(dir.path().join("state").join("portal.json"))
    }

    #[googletest::test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();

        store.set("session", "{}").unwrap();
        expect_that!(store.get("session").unwrap(), some(eq("{}")));

        store.remove("session").unwrap();
        expect_that!(store.get("session").unwrap(), none());
    }

    #[rstest]
    fn file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);

        assert!(store.get("session").unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[rstest]
    fn file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        file_store(&dir).set("cookieConsent", "true").unwrap();

        let reopened = file_store(&dir);

        assert_eq!(reopened.get("cookieConsent").unwrap().as_deref(), Some("true"));
    }

    #[rstest]
    fn file_store_keys_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        store.remove("a").unwrap();

        assert!(store.get("a").unwrap().is_none());
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[rstest]
    fn file_store_remove_missing_key_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);

        store.remove("session").unwrap();

        assert!(!store.path().exists());
    }

    #[rstest]
    fn file_store_corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();

        assert!(store.get("session").unwrap().is_none());

        store.set("session", "x").unwrap();
        assert_eq!(store.get("session").unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn file_store_from_blocking_task_and_inline() {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn KeyValueStore> = Arc::new(file_store(&dir));

        let writer = store.clone();
        tokio::task::spawn_blocking(move || writer.set("session", "{}")).await.unwrap().unwrap();

        assert_eq!(store.get("session").unwrap().as_deref(), Some("{}"));
    }

    #[rstest]
    fn stores_work_behind_trait_objects() {
        let dir = TempDir::new().unwrap();
        let stores: Vec<Arc<dyn KeyValueStore>> =
            vec![Arc::new(MemoryStore::new()), Arc::new(file_store(&dir))];

        for store in stores {
            store.set("k", "v").unwrap();
            assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        }
    }
}
