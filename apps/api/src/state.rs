use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::errors::AppError;
use crate::keyring::Keyring;
use crate::llm_client::LlmClient;
use crate::preview::PreviewRenderer;
use crate::storage::StringStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Key lifecycle controller. The mutex serializes vault operations,
    /// matching the one-action-at-a-time interaction model.
    pub keyring: Arc<Mutex<Keyring>>,
    pub store: Arc<dyn StringStore>,
    /// Shared HTTP connection pool for per-request LLM clients.
    pub http: reqwest::Client,
    pub renderer: Arc<dyn PreviewRenderer>,
    pub config: Config,
}

impl AppState {
    /// Builds an [`LlmClient`] around the currently usable API key, or
    /// fails if no key is entered/unlocked.
    pub async fn llm_for_key(&self) -> Result<LlmClient, AppError> {
        let keyring = self.keyring.lock().await;
        let api_key = keyring.plaintext().ok_or(AppError::KeyUnavailable)?;
        Ok(LlmClient::new(
            self.http.clone(),
            &self.config.llm_base_url,
            api_key,
            &self.config.default_model,
        ))
    }
}
