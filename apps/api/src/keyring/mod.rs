//! API-key lifecycle: an explicit state machine over the four key states,
//! with a pure transition function decoupled from the HTTP layer.
//!
//! States: no key at all, a key typed but not saved, an encrypted payload
//! on disk awaiting a passphrase, and a decrypted key held in memory.
//! Transitions happen only on explicit user actions or startup restore —
//! never in the background. Plaintext never survives a restart: restore
//! always lands in `EncryptedLocked`.

pub mod controller;
pub mod handlers;

pub use controller::{Keyring, KeyringError};

use zeroize::Zeroizing;

use crate::vault::EncryptedPayload;

/// Where the user's API key currently stands.
pub enum KeyState {
    /// No key entered, nothing stored.
    Absent,
    /// Key typed into the session, not yet saved.
    PlaintextEntered { key: Zeroizing<String> },
    /// An encrypted payload exists; the passphrase has not been verified.
    EncryptedLocked { payload: EncryptedPayload },
    /// Payload decrypted; the plaintext key is usable this session.
    Unlocked {
        key: Zeroizing<String>,
        payload: EncryptedPayload,
    },
}

/// Inputs to the machine: user intents plus completed vault outcomes.
/// The vault runs outside the transition so the function stays pure.
pub enum KeyEvent {
    /// User typed (or replaced) the key. An empty string clears the field.
    KeyEntered(String),
    /// Vault encryption of the in-memory key finished.
    PayloadSealed(EncryptedPayload),
    /// Vault decryption of the stored payload succeeded.
    PayloadOpened(String),
    /// Vault decryption failed; the payload stays locked.
    OpenFailed,
    /// User cleared the key everywhere.
    Cleared,
    /// Startup restore found a stored payload.
    PayloadFound(EncryptedPayload),
}

/// Storage side effects requested by a transition. The controller applies
/// them against the [`crate::storage::StringStore`].
#[derive(Debug, PartialEq, Eq)]
pub enum SideEffect {
    StorePayload(EncryptedPayload),
    RemovePayload,
}

/// The pure transition function: `(state, event) -> (state, effects)`.
///
/// Unmatched combinations leave the state untouched — e.g. a
/// `PayloadOpened` while no payload is locked is ignored rather than
/// trusted.
pub fn transition(state: KeyState, event: KeyEvent) -> (KeyState, Vec<SideEffect>) {
    match (state, event) {
        (_, KeyEvent::KeyEntered(key)) => {
            if key.is_empty() {
                (KeyState::Absent, vec![])
            } else {
                (
                    KeyState::PlaintextEntered {
                        key: Zeroizing::new(key),
                    },
                    vec![],
                )
            }
        }

        // Saving keeps the plaintext in memory: encrypting must not force
        // the user to immediately re-enter the passphrase.
        (KeyState::PlaintextEntered { key }, KeyEvent::PayloadSealed(payload))
        | (KeyState::Unlocked { key, .. }, KeyEvent::PayloadSealed(payload)) => (
            KeyState::Unlocked {
                key,
                payload: payload.clone(),
            },
            vec![SideEffect::StorePayload(payload)],
        ),

        (KeyState::EncryptedLocked { payload }, KeyEvent::PayloadOpened(key)) => (
            KeyState::Unlocked {
                key: Zeroizing::new(key),
                payload,
            },
            vec![],
        ),

        // Failed unlock: stay locked. No lockout counter, no rate limiting —
        // a single-user local store, and PBKDF2 already prices each guess.
        (state @ KeyState::EncryptedLocked { .. }, KeyEvent::OpenFailed) => (state, vec![]),

        (_, KeyEvent::Cleared) => (KeyState::Absent, vec![SideEffect::RemovePayload]),

        // Restore wins over any in-memory state: plaintext does not
        // persist across reloads.
        (_, KeyEvent::PayloadFound(payload)) => (KeyState::EncryptedLocked { payload }, vec![]),

        (state, _) => (state, vec![]),
    }
}

impl KeyState {
    /// Stable label used in status responses and logs.
    pub fn label(&self) -> &'static str {
        match self {
            KeyState::Absent => "absent",
            KeyState::PlaintextEntered { .. } => "plaintext_entered",
            KeyState::EncryptedLocked { .. } => "encrypted_locked",
            KeyState::Unlocked { .. } => "unlocked",
        }
    }

    /// The usable plaintext key, if this state holds one.
    pub fn plaintext(&self) -> Option<&str> {
        match self {
            KeyState::PlaintextEntered { key } | KeyState::Unlocked { key, .. } => {
                Some(key.as_str())
            }
            _ => None,
        }
    }

    /// The encrypted payload, if this state carries one.
    pub fn payload(&self) -> Option<&EncryptedPayload> {
        match self {
            KeyState::EncryptedLocked { payload } | KeyState::Unlocked { payload, .. } => {
                Some(payload)
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for KeyState {
    // Masked: states must never leak the plaintext key into logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
