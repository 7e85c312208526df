//! Axum route handlers for resume upload and retrieval.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;

use crate::errors::AppError;
use crate::state::AppState;

use super::{load_last, save_last, ResumeSnapshot};

/// POST /api/v1/resumes
///
/// Multipart upload of a `.tex` file (field name `file`). The snapshot is
/// stored for the next session when persistence is enabled; the response
/// carries it either way.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeSnapshot>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("resume.tex").to_string();
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;

        let content = String::from_utf8(data.to_vec())
            .map_err(|_| AppError::Validation("resume must be UTF-8 text".to_string()))?;
        if content.trim().is_empty() {
            return Err(AppError::Validation("resume file is empty".to_string()));
        }

        let snapshot = ResumeSnapshot {
            name,
            content,
            saved_at: Utc::now(),
        };
        save_last(state.store.as_ref(), &snapshot);
        return Ok(Json(snapshot));
    }

    Err(AppError::Validation(
        "multipart body must contain a `file` field".to_string(),
    ))
}

/// GET /api/v1/resumes/last
pub async fn handle_get_last(
    State(state): State<AppState>,
) -> Result<Json<ResumeSnapshot>, AppError> {
    load_last(state.store.as_ref())
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no stored resume".to_string()))
}
