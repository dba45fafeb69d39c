use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::warn;

/// Key holding the last-known active path.
pub const CURRENT_PAGE_KEY: &str = "currentPage";

/// Session-scoped key/value storage.
///
/// Reads and writes are infallible from the caller's point of view: a store
/// that cannot reach its backing medium reports keys as absent and drops
/// writes, so navigation never fails because of storage.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    /// End of session. Removes every key.
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
    }

    fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
    }
}

#[derive(Debug, Error)]
enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed session file: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON file store that survives process restarts within the same session
/// directory.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileSessionStore {
    pub const FILE_NAME: &'static str = "session.json";

    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(Self::FILE_NAME),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string(entries)?)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        match self.load() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                warn!("Failed to read session store {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let result = self
            .load()
            .or_else(|e| {
                warn!("Discarding unreadable session store: {}", e);
                Ok::<_, StoreError>(HashMap::new())
            })
            .and_then(|mut entries| {
                entries.insert(key.to_string(), value.to_string());
                self.save(&entries)
            });
        if let Err(e) = result {
            warn!("Failed to write session store {}: {}", self.path.display(), e);
        }
    }

    fn clear(&self) {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to clear session store {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_last_writer_wins() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get(CURRENT_PAGE_KEY), None);
        store.set(CURRENT_PAGE_KEY, "/");
        store.set(CURRENT_PAGE_KEY, "/products");
        assert_eq!(store.get(CURRENT_PAGE_KEY).as_deref(), Some("/products"));
        store.clear();
        assert_eq!(store.get(CURRENT_PAGE_KEY), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.set(CURRENT_PAGE_KEY, "/about");

        let reopened = FileSessionStore::new(dir.path());
        assert_eq!(reopened.get(CURRENT_PAGE_KEY).as_deref(), Some("/about"));

        reopened.clear();
        assert!(!reopened.path().exists());
        assert_eq!(store.get(CURRENT_PAGE_KEY), None);
    }

    #[test]
    fn file_store_treats_garbage_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        assert_eq!(store.get(CURRENT_PAGE_KEY), None);
        store.set(CURRENT_PAGE_KEY, "/");
        assert_eq!(store.get(CURRENT_PAGE_KEY).as_deref(), Some("/"));
    }

    #[test]
    fn file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("tab"));
        store.set(CURRENT_PAGE_KEY, "/");
        assert!(store.path().exists());
    }
}
