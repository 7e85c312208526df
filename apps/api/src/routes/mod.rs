pub mod health;
pub mod settings;

use axum::{
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::keyring::handlers as keyring_handlers;
use crate::preview::handlers as preview_handlers;
use crate::resume::handlers as resume_handlers;
use crate::state::AppState;
use crate::tailor::handlers as tailor_handlers;

async fn not_implemented() -> Result<(), AppError> {
    Err(AppError::NotImplemented)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Key lifecycle
        .route(
            "/api/v1/keyring/status",
            get(keyring_handlers::handle_status),
        )
        .route("/api/v1/keyring/key", post(keyring_handlers::handle_enter_key))
        .route("/api/v1/keyring/save", post(keyring_handlers::handle_save))
        .route(
            "/api/v1/keyring/unlock",
            post(keyring_handlers::handle_unlock),
        )
        .route("/api/v1/keyring/clear", post(keyring_handlers::handle_clear))
        // Settings
        .route(
            "/api/v1/settings/persistence",
            get(settings::handle_get_persistence).put(settings::handle_set_persistence),
        )
        // Resume snapshots
        .route("/api/v1/resumes", post(resume_handlers::handle_upload))
        .route("/api/v1/resumes/last", get(resume_handlers::handle_get_last))
        // Tailoring
        .route("/api/v1/tailor", post(tailor_handlers::handle_tailor))
        .route("/api/v1/models", get(tailor_handlers::handle_models))
        // JD-from-URL scraping is not built yet
        .route("/api/v1/tailor/from-url", post(not_implemented))
        // Preview
        .route("/api/v1/preview", post(preview_handlers::handle_preview))
        .with_state(state)
}
