//! Last-uploaded resume snapshot, persisted across sessions when the
//! privacy flag allows it.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{self, keys, StringStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSnapshot {
    pub name: String,
    pub content: String,
    #[serde(rename = "savedAt")]
    pub saved_at: DateTime<Utc>,
}

/// Loads the stored snapshot, if any. An unparseable snapshot is treated
/// as absent.
pub fn load_last(store: &dyn StringStore) -> Option<ResumeSnapshot> {
    let raw = store.get(keys::LAST_RESUME)?;
    match serde_json::from_str(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("ignoring unparseable stored resume: {e}");
            None
        }
    }
}

/// Persists the snapshot, gated by the persistence flag. Best-effort like
/// all storage writes.
pub fn save_last(store: &dyn StringStore, snapshot: &ResumeSnapshot) {
    if !storage::persistence_enabled(store) {
        return;
    }
    match serde_json::to_string(snapshot) {
        Ok(json) => store.set(keys::LAST_RESUME, &json),
        Err(e) => warn!("failed to serialize resume snapshot: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;

    fn snapshot() -> ResumeSnapshot {
        ResumeSnapshot {
            name: "resume.tex".into(),
            content: "\\documentclass{article}".into(),
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = MemoryStore::new();
        save_last(&store, &snapshot());
        let loaded = load_last(&store).unwrap();
        assert_eq!(loaded.name, "resume.tex");
        assert_eq!(loaded.content, "\\documentclass{article}");
    }

    #[test]
    fn test_saved_at_uses_camel_case_key() {
        let json = serde_json::to_value(snapshot()).unwrap();
        assert!(json.get("savedAt").is_some());
    }

    #[test]
    fn test_save_respects_persistence_flag() {
        let store = MemoryStore::new();
        storage::set_persistence(&store, false);
        save_last(&store, &snapshot());
        assert!(load_last(&store).is_none());
    }

    #[test]
    fn test_corrupt_snapshot_loads_as_none() {
        let store = MemoryStore::new();
        store.set(keys::LAST_RESUME, "not json");
        assert!(load_last(&store).is_none());
    }
}
