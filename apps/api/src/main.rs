mod config;
mod errors;
mod llm_client;
mod quotation;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{CompletionClient, OpenAiClient};
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cotizador API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm: Arc<dyn CompletionClient> = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    )?);
    info!(
        "LLM client initialized (model: {}, attachments: {:?})",
        llm_client::MODEL,
        config.attachment_mode
    );

    if !config.template_path.is_file() {
        warn!(
            "Quotation template not found at {}; document generation will fail until it exists",
            config.template_path.display()
        );
    }

    let state = AppState {
        llm,
        config: config.clone(),
    };

    if config.cors_allowed_origins.is_empty() {
        warn!("CORS_ALLOWED_ORIGINS not set; allowing any origin");
    }
    let cors = cors_layer(&config.cors_allowed_origins)?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
