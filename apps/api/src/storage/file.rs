//! File-backed [`StringStore`]: one file per key under the data directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use super::StringStore;

/// Stores each key as a plain file named after the key. Keys are fixed
/// identifiers (see [`super::keys`]), never user input, so no path
/// sanitization is needed.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens the store, creating the data directory if missing.
    pub fn open(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl StringStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("failed to read {key}: {e}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::write(self.path_for(key), value) {
            warn!("failed to write {key}: {e}");
        }
    }

    fn remove(&self, key: &str) {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove {key}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path().to_path_buf()).unwrap();

        assert!(store.get("some_key").is_none());
        store.set("some_key", "value");
        assert_eq!(store.get("some_key").as_deref(), Some("value"));
        store.remove("some_key");
        assert!(store.get("some_key").is_none());
    }

    #[test]
    fn test_remove_missing_key_is_silent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path().to_path_buf()).unwrap();
        store.remove("never_written");
    }

    #[test]
    fn test_values_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(tmp.path().to_path_buf()).unwrap();
            store.set("k", "persisted");
        }
        let store = FileStore::open(tmp.path().to_path_buf()).unwrap();
        assert_eq!(store.get("k").as_deref(), Some("persisted"));
    }
}
