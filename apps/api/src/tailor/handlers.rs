//! Axum route handlers for the Tailoring API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::resume;
use crate::state::AppState;
use crate::tailor::tailor_resume;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TailorRequest {
    pub jd_text: String,
    /// Inline resume source; falls back to the stored snapshot when absent.
    pub resume_content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TailorResponse {
    pub model: String,
    pub tailored_tex: String,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/tailor
///
/// Full pipeline: resolve model, build prompt, generate, strip fences.
/// Requires a usable API key (entered or unlocked).
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<TailorRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    if request.jd_text.trim().is_empty() {
        return Err(AppError::Validation("jd_text cannot be empty".to_string()));
    }

    let resume_tex = match request.resume_content {
        Some(content) if !content.trim().is_empty() => content,
        _ => {
            resume::load_last(state.store.as_ref())
                .ok_or_else(|| {
                    AppError::NotFound(
                        "no resume provided and no stored resume found".to_string(),
                    )
                })?
                .content
        }
    };

    let llm = state.llm_for_key().await?;
    let outcome = tailor_resume(&llm, &resume_tex, &request.jd_text).await?;

    Ok(Json(TailorResponse {
        model: outcome.model,
        tailored_tex: outcome.tailored_tex,
    }))
}

/// GET /api/v1/models
///
/// The provider models usable for text generation. Strict: an empty
/// listing is an error, not a silent fallback.
pub async fn handle_models(
    State(state): State<AppState>,
) -> Result<Json<ModelsResponse>, AppError> {
    let llm = state.llm_for_key().await?;
    let models = llm.text_models().await?;
    Ok(Json(ModelsResponse {
        models: models.into_iter().map(|m| m.name).collect(),
    }))
}
