mod config;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::ai::AiExtractionClient;
use crate::extraction::pipeline::ExtractionPipeline;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV ingest API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.llm_config())?;
    info!(
        "LLM client initialized (model: {}, base url: {})",
        llm.model(),
        config.llm_base_url
    );
    if config.llm_api_key.is_none() {
        warn!("No LLM API key configured; AI strategies will report a missing credential");
    }

    let pipeline = ExtractionPipeline::new(
        AiExtractionClient::new(Arc::new(llm)),
        config.pipeline_config(),
    );
    info!(
        "Extraction pipeline ready (default strategy: {}, AI timeout: {}s, retries: {})",
        config.default_strategy.as_str(),
        config.ai_timeout_secs,
        config.ai_max_retries
    );

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
