mod config;
mod errors;
mod keyring;
mod llm_client;
mod preview;
mod resume;
mod routes;
mod state;
mod storage;
mod tailor;
mod vault;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::keyring::Keyring;
use crate::llm_client::LlmClient;
use crate::preview::CommandRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::file::FileStore;
use crate::vault::OsRandom;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (nothing is required; defaults apply)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("resume_wizard={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Wizard API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the local key-value store
    let store: Arc<dyn storage::StringStore> =
        Arc::new(FileStore::open(config.data_dir.clone())?);
    info!("Local store at {}", config.data_dir.display());

    // Restore the key lifecycle: a stored payload starts the session locked
    let keyring = Keyring::restore(store.clone(), Arc::new(OsRandom));
    info!("Keyring state: {}", keyring.state().label());

    // Preview renderer: probed lazily on first use, never at startup
    let renderer = CommandRenderer::from_command_line(
        &config.renderer_cmd,
        "install pandoc (https://pandoc.org/installing.html) or set RENDERER_CMD",
    )
    .ok_or_else(|| anyhow::anyhow!("RENDERER_CMD must not be empty"))?;

    // Build app state
    let state = AppState {
        keyring: Arc::new(Mutex::new(keyring)),
        store,
        http: LlmClient::http_client(),
        renderer: Arc::new(renderer),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // local single-user tool; the UI runs on another port

    let addr: SocketAddr = format!("127.0.0.1:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
