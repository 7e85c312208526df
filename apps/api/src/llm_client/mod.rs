//! LLM Client — the single point of entry for all generative-AI calls.
//!
//! ARCHITECTURAL RULE: no other module may call the provider API directly.
//! All LLM interactions MUST go through this module.
//!
//! The provider is the Gemini REST API. The model is not hardcoded: the
//! client lists the available models and picks one that supports text
//! generation, falling back to a default identifier when the listing fails
//! or nothing matches.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com";
/// Fallback model when listing fails or returns nothing usable.
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash";
/// Generation method a model must support to be usable here.
const GENERATE_METHOD: &str = "generateContent";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejection; the provider's own message, passed through
    /// verbatim.
    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("model returned empty content")]
    EmptyContent,

    #[error("no available model supports text generation")]
    NoModelAvailable,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_METHOD)
    }
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorEnvelope {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Client bound to one API key. Built per request from the unlocked
/// keyring; the connection pool is shared via the cloned [`Client`].
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl LlmClient {
    /// Builds the shared HTTP client used by all [`LlmClient`] instances.
    pub fn http_client() -> Client {
        Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client")
    }

    pub fn new(client: Client, base_url: &str, api_key: &str, default_model: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.to_string(),
        }
    }

    /// The production API base. Tests inject a mock server URL instead.
    pub fn default_base_url() -> &'static str {
        API_BASE
    }

    /// Lists all models the provider offers for this key.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let url = format!("{}/v1beta/models?key={}", self.base_url, self.api_key);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(provider_error(status.as_u16(), body));
        }
        let body = response.text().await?;
        let listing: ListModelsResponse = serde_json::from_str(&body)?;
        Ok(listing.models)
    }

    /// Strict listing: the models usable for text generation, or
    /// `NoModelAvailable` when the provider offers none.
    pub async fn text_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let models: Vec<ModelInfo> = self
            .list_models()
            .await?
            .into_iter()
            .filter(ModelInfo::supports_generation)
            .collect();
        if models.is_empty() {
            return Err(LlmError::NoModelAvailable);
        }
        Ok(models)
    }

    /// Picks the model to generate with: the configured default when the
    /// listing confirms it supports generation, otherwise the first model
    /// that does, otherwise the default anyway. Never fails — listing
    /// problems fall back rather than block the tailoring flow.
    pub async fn resolve_model(&self) -> String {
        let models = match self.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!(
                    "model listing failed, falling back to {}: {e}",
                    self.default_model
                );
                return self.default_model.clone();
            }
        };
        let capable: Vec<ModelInfo> = models
            .into_iter()
            .filter(ModelInfo::supports_generation)
            .collect();
        if capable.iter().any(|m| m.name == self.default_model) {
            return self.default_model.clone();
        }
        match capable.into_iter().next() {
            Some(model) => model.name,
            None => {
                warn!(
                    "no listed model supports text generation, falling back to {}",
                    self.default_model
                );
                self.default_model.clone()
            }
        }
    }

    /// Makes a text-generation call, returning the first candidate's text.
    /// Retries on 429 and 5xx with exponential backoff.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1beta/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        let request_body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&url).json(&request_body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("provider returned {}: {}", status, body);
                last_error = Some(provider_error(status.as_u16(), body));
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(provider_error(status.as_u16(), body));
            }

            let body = response.text().await?;
            let generated: GenerateResponse = serde_json::from_str(&body)?;

            let text = generated
                .candidates
                .into_iter()
                .find_map(|c| {
                    c.content
                        .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
                })
                .ok_or(LlmError::EmptyContent)?;

            debug!("LLM call succeeded: {} chars", text.len());
            return Ok(text);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Builds a Provider error, preferring the provider's own message so the
/// user sees it verbatim.
fn provider_error(status: u16, body: String) -> LlmError {
    let message = serde_json::from_str::<ProviderErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    LlmError::Provider { status, message }
}

/// Strips markdown code fences (```latex ... ```, ```tex ... ```, or bare
/// ``` ... ```) that models wrap around their output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag: everything up to the first newline.
    let body = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    body.strip_suffix("```").map(str::trim).unwrap_or(body.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LlmClient {
        LlmClient::new(
            LlmClient::http_client(),
            &server.uri(),
            "test-key",
            DEFAULT_MODEL,
        )
    }

    #[test]
    fn test_strip_code_fences_with_latex_tag() {
        let input = "```latex\n\\documentclass{article}\n```";
        assert_eq!(strip_code_fences(input), "\\documentclass{article}");
    }

    #[test]
    fn test_strip_code_fences_without_tag() {
        let input = "```\n\\documentclass{article}\n```";
        assert_eq!(strip_code_fences(input), "\\documentclass{article}");
    }

    #[test]
    fn test_strip_code_fences_no_fences() {
        let input = "\\documentclass{article}";
        assert_eq!(strip_code_fences(input), "\\documentclass{article}");
    }

    #[test]
    fn test_provider_error_prefers_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        let err = provider_error(400, body.to_string());
        assert_eq!(err.to_string(), "API key not valid");
    }

    #[test]
    fn test_provider_error_falls_back_to_raw_body() {
        let err = provider_error(502, "upstream exploded".to_string());
        assert_eq!(err.to_string(), "upstream exploded");
    }

    #[tokio::test]
    async fn test_generate_returns_first_text_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/{DEFAULT_MODEL}:generateContent")))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [
                    {"content": {"parts": [{"text": "tailored resume"}], "role": "model"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let text = client.generate(DEFAULT_MODEL, "prompt").await.unwrap();
        assert_eq!(text, "tailored resume");
    }

    #[tokio::test]
    async fn test_generate_surfaces_provider_message_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.generate(DEFAULT_MODEL, "prompt").await.unwrap_err();
        match err {
            LlmError::Provider { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid. Please pass a valid API key.");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_empty_candidates_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.generate(DEFAULT_MODEL, "prompt").await,
            Err(LlmError::EmptyContent)
        ));
    }

    #[tokio::test]
    async fn test_resolve_model_prefers_listed_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]},
                    {"name": "models/gemini-other", "supportedGenerationMethods": ["generateContent"]},
                    {"name": DEFAULT_MODEL, "supportedGenerationMethods": ["generateContent"]}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.resolve_model().await, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_resolve_model_takes_first_capable_when_default_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]},
                    {"name": "models/gemini-other", "supportedGenerationMethods": ["generateContent"]}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.resolve_model().await, "models/gemini-other");
    }

    #[tokio::test]
    async fn test_resolve_model_falls_back_when_listing_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.resolve_model().await, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_text_models_empty_listing_is_no_model_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.text_models().await,
            Err(LlmError::NoModelAvailable)
        ));
    }
}
