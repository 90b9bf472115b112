// Key-value storage backends for the cache.
// Mirrors the localStorage contract: string keys, string values, no expiry.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{HubbubError, Result};

use super::paths;

/// A string-keyed store of string values.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, overwriting any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Remove every key.
    fn clear(&self) -> Result<()>;
}

/// In-process store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_items<R>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> R) -> Result<R> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| HubbubError::Storage("memory store lock poisoned".into()))?;
        Ok(f(&mut items))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.with_items(|items| items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.with_items(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.with_items(|items| {
            items.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.with_items(|items| items.clear())
    }
}

/// Store keeping one file per key under a base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Store rooted at the platform cache directory.
    pub fn open_default() -> Result<Self> {
        paths::cache_dir()
            .map(Self::new)
            .ok_or_else(|| HubbubError::Storage("no cache directory for this platform".into()))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = paths::entry_path(&self.base, key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)?;
        Ok(Some(contents))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = paths::entry_path(&self.base, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = paths::entry_path(&self.base, key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let dir = paths::entries_dir(&self.base);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("k").unwrap(), None);

        store.set_item("k", "v1").unwrap();
        store.set_item("k", "v2").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        store.remove_item("k").unwrap();
        store.remove_item("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert_eq!(store.base(), temp_dir.path());

        store.set_item("hubbub-gist-1", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get_item("hubbub-gist-1").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(temp_dir.path().join("entries/hubbub-gist-1.json").exists());
        assert!(!temp_dir.path().join("entries/hubbub-gist-1.tmp").exists());
    }

    #[test]
    fn test_file_store_remove_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        assert_eq!(store.get_item("missing").unwrap(), None);
        store.remove_item("missing").unwrap();

        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();
        store.remove_item("a").unwrap();
        assert_eq!(store.get_item("a").unwrap(), None);

        store.clear().unwrap();
        assert_eq!(store.get_item("b").unwrap(), None);
        store.clear().unwrap();
    }
}
