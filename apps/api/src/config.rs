use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client;

/// Application configuration loaded from environment variables.
/// Nothing here is required: the API key comes from the user at runtime
/// (through the vault), so startup never blocks on missing secrets.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Directory backing the local key-value store.
    pub data_dir: PathBuf,
    /// Model identifier used when listing fails or matches nothing.
    pub default_model: String,
    /// Command line for the LaTeX-to-HTML preview converter.
    pub renderer_cmd: String,
    /// Provider API base; overridable for local testing.
    pub llm_base_url: String,
    pub rust_log: String,
}

const DEFAULT_RENDERER_CMD: &str = "pandoc -f latex -t html5";

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),
            default_model: std::env::var("RESUME_WIZARD_MODEL")
                .unwrap_or_else(|_| llm_client::DEFAULT_MODEL.to_string()),
            renderer_cmd: std::env::var("RENDERER_CMD")
                .unwrap_or_else(|_| DEFAULT_RENDERER_CMD.to_string()),
            llm_base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| llm_client::LlmClient::default_base_url().to_string()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("resume-wizard")
}
