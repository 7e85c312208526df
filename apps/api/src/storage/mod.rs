//! Local key-value persistence for session state.
//!
//! Durability here is best-effort: a failed write or delete is logged and
//! swallowed, never surfaced to the caller. The vault and LLM layers have
//! their own strict error paths; storage degrades to "nothing was saved".

pub mod file;
pub mod memory;

/// Storage keys. Values are always strings (JSON where structured).
pub mod keys {
    /// JSON-serialized `EncryptedPayload` for the user's API key.
    pub const API_KEY_ENC: &str = "resume_wizard_api_key_enc";
    /// JSON `{name, content, savedAt}` snapshot of the last uploaded resume.
    pub const LAST_RESUME: &str = "resume_wizard_last_resume";
    /// Persistence opt-out flag: `"1"` or `"0"`.
    pub const PERSISTENCE: &str = "resume_wizard_persistence";
}

/// A string-valued key-value store.
///
/// `set` and `remove` are best-effort: implementations must not return or
/// panic on IO failure.
pub trait StringStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Whether durable writes are currently allowed. Defaults to enabled when
/// the flag has never been set.
pub fn persistence_enabled(store: &dyn StringStore) -> bool {
    store
        .get(keys::PERSISTENCE)
        .map(|v| v != "0")
        .unwrap_or(true)
}

/// Toggles the persistence flag.
///
/// Disabling is a privacy opt-out: every stored artifact (resume snapshot,
/// encrypted API key) is deleted immediately and later writes are suppressed
/// via [`persistence_enabled`]. The flag itself is always written so the
/// opt-out survives a restart.
pub fn set_persistence(store: &dyn StringStore, enabled: bool) {
    store.set(keys::PERSISTENCE, if enabled { "1" } else { "0" });
    if !enabled {
        store.remove(keys::API_KEY_ENC);
        store.remove(keys::LAST_RESUME);
    }
}
