//! Persistence opt-out endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::storage;

#[derive(Debug, Deserialize)]
pub struct PersistenceRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct PersistenceResponse {
    pub enabled: bool,
}

/// GET /api/v1/settings/persistence
pub async fn handle_get_persistence(State(state): State<AppState>) -> Json<PersistenceResponse> {
    Json(PersistenceResponse {
        enabled: storage::persistence_enabled(state.store.as_ref()),
    })
}

/// PUT /api/v1/settings/persistence
///
/// Disabling is a privacy opt-out: stored artifacts are deleted
/// immediately and future writes are suppressed.
pub async fn handle_set_persistence(
    State(state): State<AppState>,
    Json(request): Json<PersistenceRequest>,
) -> Json<PersistenceResponse> {
    storage::set_persistence(state.store.as_ref(), request.enabled);
    Json(PersistenceResponse {
        enabled: request.enabled,
    })
}
