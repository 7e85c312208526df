use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::keyring::KeyringError;
use crate::llm_client::LlmError;
use crate::preview::RenderError;
use crate::vault::VaultError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("API key not available: enter or unlock it first")]
    KeyUnavailable,

    #[error(transparent)]
    Keyring(#[from] KeyringError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Not implemented")]
    NotImplemented,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::KeyUnavailable => (
                StatusCode::UNAUTHORIZED,
                "KEY_UNAVAILABLE",
                self.to_string(),
            ),
            // Vault and keyring failures are always surfaced with the
            // failure kind in user terms — never swallowed.
            AppError::Keyring(e) => keyring_response(e),
            AppError::Vault(e) => vault_response(e),
            AppError::Llm(e) => llm_response(e),
            AppError::Render(e) => match e {
                RenderError::Unavailable { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, "RENDER_UNAVAILABLE", e.to_string())
                }
                RenderError::Failed(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_FAILED", e.to_string())
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::NotImplemented => (
                StatusCode::NOT_IMPLEMENTED,
                "NOT_IMPLEMENTED",
                "This endpoint is not yet implemented".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

fn keyring_response(e: &KeyringError) -> (StatusCode, &'static str, String) {
    match e {
        KeyringError::NoKey => (StatusCode::CONFLICT, "NO_KEY", e.to_string()),
        KeyringError::NothingStored => (StatusCode::CONFLICT, "NOTHING_STORED", e.to_string()),
        KeyringError::Vault(v) => vault_response(v),
    }
}

fn vault_response(e: &VaultError) -> (StatusCode, &'static str, String) {
    match e {
        VaultError::AuthenticationFailed => (
            StatusCode::UNAUTHORIZED,
            "AUTHENTICATION_FAILED",
            e.to_string(),
        ),
        VaultError::InvalidPayload(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_PAYLOAD",
            e.to_string(),
        ),
        VaultError::InvalidSaltLength(_) => {
            (StatusCode::BAD_REQUEST, "INVALID_SALT_LENGTH", e.to_string())
        }
        VaultError::CryptoUnavailable(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "CRYPTO_UNAVAILABLE",
            e.to_string(),
        ),
    }
}

fn llm_response(e: &LlmError) -> (StatusCode, &'static str, String) {
    match e {
        LlmError::NoModelAvailable => (
            StatusCode::NOT_FOUND,
            "NO_MODEL_AVAILABLE",
            e.to_string(),
        ),
        // Provider messages pass through verbatim so the user sees what
        // the provider actually said.
        LlmError::Provider { .. } => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", e.to_string()),
        LlmError::RateLimited { .. } => {
            (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", e.to_string())
        }
        LlmError::Http(_) | LlmError::Parse(_) | LlmError::EmptyContent => {
            tracing::error!("LLM error: {e}");
            (StatusCode::BAD_GATEWAY, "LLM_ERROR", e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_failure_names_the_kind_in_user_terms() {
        let (status, code, message) = vault_response(&VaultError::AuthenticationFailed);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, "AUTHENTICATION_FAILED");
        assert!(message.contains("invalid passphrase"));
    }

    #[test]
    fn test_provider_message_is_verbatim() {
        let err = LlmError::Provider {
            status: 400,
            message: "API key not valid".to_string(),
        };
        let (_, code, message) = llm_response(&err);
        assert_eq!(code, "PROVIDER_ERROR");
        assert_eq!(message, "API key not valid");
    }
}
