//! Stateful side of the key lifecycle: owns the current [`KeyState`],
//! invokes the vault, and applies storage effects.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::storage::{self, keys, StringStore};
use crate::vault::{self, RandomSource, VaultError};

use super::{transition, KeyEvent, KeyState, SideEffect};

#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("no API key entered")]
    NoKey,

    #[error("nothing to unlock: no encrypted key is stored")]
    NothingStored,

    #[error(transparent)]
    Vault(#[from] VaultError),
}

pub struct Keyring {
    state: KeyState,
    store: Arc<dyn StringStore>,
    rng: Arc<dyn RandomSource>,
}

impl Keyring {
    /// Builds the keyring from persisted state. A stored payload always
    /// starts the session in `EncryptedLocked`; a payload that fails to
    /// parse is treated as absent (and logged) rather than wedging startup.
    pub fn restore(store: Arc<dyn StringStore>, rng: Arc<dyn RandomSource>) -> Self {
        let mut keyring = Self {
            state: KeyState::Absent,
            store,
            rng,
        };
        if let Some(raw) = keyring.store.get(keys::API_KEY_ENC) {
            match serde_json::from_str(&raw) {
                Ok(payload) => {
                    info!("found encrypted API key, starting locked");
                    keyring.apply(KeyEvent::PayloadFound(payload));
                }
                Err(e) => warn!("ignoring unparseable stored key payload: {e}"),
            }
        }
        keyring
    }

    pub fn state(&self) -> &KeyState {
        &self.state
    }

    /// The usable plaintext key, present in `PlaintextEntered` and
    /// `Unlocked`.
    pub fn plaintext(&self) -> Option<&str> {
        self.state.plaintext()
    }

    /// User typed a key into the session.
    pub fn enter_key(&mut self, key: &str) {
        self.apply(KeyEvent::KeyEntered(key.to_string()));
    }

    /// Encrypt-and-save: seals the in-memory key under `passphrase` and
    /// persists the payload. The key stays usable afterwards.
    pub fn save(&mut self, passphrase: &str) -> Result<(), KeyringError> {
        let key = self.state.plaintext().ok_or(KeyringError::NoKey)?;
        let payload = vault::encrypt(key, passphrase, self.rng.as_ref())?;
        self.apply(KeyEvent::PayloadSealed(payload));
        Ok(())
    }

    /// Attempts to decrypt the locked payload. On failure the state is
    /// unchanged and the vault error is returned — surfaced, never
    /// swallowed.
    pub fn unlock(&mut self, passphrase: &str) -> Result<(), KeyringError> {
        let payload = match &self.state {
            KeyState::EncryptedLocked { payload } => payload.clone(),
            _ => return Err(KeyringError::NothingStored),
        };
        match vault::decrypt(&payload, passphrase) {
            Ok(key) => {
                self.apply(KeyEvent::PayloadOpened(key));
                Ok(())
            }
            Err(e) => {
                self.apply(KeyEvent::OpenFailed);
                Err(e.into())
            }
        }
    }

    /// Wipes the in-memory key and deletes the stored payload.
    pub fn clear(&mut self) {
        self.apply(KeyEvent::Cleared);
    }

    fn apply(&mut self, event: KeyEvent) {
        let state = std::mem::replace(&mut self.state, KeyState::Absent);
        let (next, effects) = transition(state, event);
        self.state = next;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&self, effect: SideEffect) {
        match effect {
            SideEffect::StorePayload(payload) => {
                if !storage::persistence_enabled(self.store.as_ref()) {
                    return;
                }
                match serde_json::to_string(&payload) {
                    Ok(json) => self.store.set(keys::API_KEY_ENC, &json),
                    Err(e) => warn!("failed to serialize key payload: {e}"),
                }
            }
            // Deletion is always allowed, persistence flag or not.
            SideEffect::RemovePayload => self.store.remove(keys::API_KEY_ENC),
        }
    }
}
