//! Axum route handler for the LaTeX preview API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub latex: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub html: String,
}

/// POST /api/v1/preview
///
/// Renders LaTeX to HTML via the configured external converter. When the
/// converter is missing the error carries an installation hint rather
/// than failing the whole flow.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    if request.latex.trim().is_empty() {
        return Err(AppError::Validation("latex cannot be empty".to_string()));
    }
    let html = state.renderer.render_to_html(&request.latex).await?;
    Ok(Json(PreviewResponse { html }))
}
