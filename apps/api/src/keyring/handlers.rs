//! Axum route handlers for the key lifecycle API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EnterKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct PassphraseRequest {
    pub passphrase: String,
}

#[derive(Debug, Serialize)]
pub struct KeyStatusResponse {
    pub state: &'static str,
    /// Whether a tailoring call can run right now.
    pub key_available: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/keyring/status
pub async fn handle_status(State(state): State<AppState>) -> Json<KeyStatusResponse> {
    let keyring = state.keyring.lock().await;
    Json(status_of(&keyring))
}

/// POST /api/v1/keyring/key
///
/// Puts the typed key into session memory. An empty key clears the field.
pub async fn handle_enter_key(
    State(state): State<AppState>,
    Json(request): Json<EnterKeyRequest>,
) -> Json<KeyStatusResponse> {
    let mut keyring = state.keyring.lock().await;
    keyring.enter_key(request.api_key.trim());
    Json(status_of(&keyring))
}

/// POST /api/v1/keyring/save
///
/// Encrypts the in-memory key under the passphrase and persists the
/// payload. The key remains usable for this session.
pub async fn handle_save(
    State(state): State<AppState>,
    Json(request): Json<PassphraseRequest>,
) -> Result<Json<KeyStatusResponse>, AppError> {
    if request.passphrase.is_empty() {
        return Err(AppError::Validation("passphrase cannot be empty".to_string()));
    }
    let mut keyring = state.keyring.lock().await;
    keyring.save(&request.passphrase)?;
    Ok(Json(status_of(&keyring)))
}

/// POST /api/v1/keyring/unlock
///
/// Decrypts the stored payload. A wrong passphrase or a tampered payload
/// returns the same authentication error and leaves the payload locked.
pub async fn handle_unlock(
    State(state): State<AppState>,
    Json(request): Json<PassphraseRequest>,
) -> Result<Json<KeyStatusResponse>, AppError> {
    let mut keyring = state.keyring.lock().await;
    keyring.unlock(&request.passphrase)?;
    Ok(Json(status_of(&keyring)))
}

/// POST /api/v1/keyring/clear
///
/// Wipes the in-memory key and deletes the stored payload.
pub async fn handle_clear(State(state): State<AppState>) -> Json<KeyStatusResponse> {
    let mut keyring = state.keyring.lock().await;
    keyring.clear();
    Json(status_of(&keyring))
}

fn status_of(keyring: &super::Keyring) -> KeyStatusResponse {
    KeyStatusResponse {
        state: keyring.state().label(),
        key_available: keyring.plaintext().is_some(),
    }
}
