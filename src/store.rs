use std::fs;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::error::Result;

/// Flat string-to-string persistence used by the healing and vision caches.
///
/// The trait keeps the storage backend swappable; an embedded database
/// could replace the JSON file without touching the healing layer.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &str, value: &str);
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist current contents to the backing medium
    fn flush(&self) -> Result<()>;
}

/// JSON-file-backed store.
///
/// Loads the whole map at construction; a missing or corrupt file starts
/// empty with a warning rather than failing. Writes re-serialize the whole
/// map. There is no cross-process locking; concurrent writers from separate
/// processes can lose entries.
pub struct JsonFileStore {
    path: PathBuf,
    map: IndexMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("Corrupt store file {}, starting empty: {}", path.display(), e);
                    IndexMap::new()
                }
            },
            Err(_) => IndexMap::new(),
        };

        Self { path, map }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.map)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    map: IndexMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("a", "1");
        store.set("b", "2");
        assert_eq!(store.get("a"), Some("1"));
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.get("a").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_store_persists_across_reopens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = JsonFileStore::open(&path);
        store.set("playwright:#old:Submit", "button[type='submit']");
        store.flush().unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(
            reopened.get("playwright:#old:Submit"),
            Some("button[type='submit']")
        );
    }

    #[test]
    fn test_json_store_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("nope.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_store_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn test_json_store_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deep/store.json");

        let mut store = JsonFileStore::open(&path);
        store.set("k", "v");
        store.flush().unwrap();

        assert!(path.exists());
    }
}
