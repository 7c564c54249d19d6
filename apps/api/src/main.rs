mod agents;
mod config;
mod db;
mod errors;
mod models;
mod page_source;
mod pages;
mod posts;
mod profile;
mod routes;
mod state;
mod templates;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::agents::AgentClient;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::page_source::{PageSource, WikiClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Team Knowledge API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    let page_source: Arc<dyn PageSource> = Arc::new(WikiClient::new(
        config.page_source_base_url.clone(),
        config.page_source_cookie.clone(),
    ));
    info!(
        "Page source client initialized ({})",
        config.page_source_base_url
    );

    let agents = AgentClient::new(
        config.agent_base_url.clone(),
        config.agent_api_key.clone(),
        config.summary_workflow_id.clone(),
        config.filter_workflow_id.clone(),
    );
    info!("Agent client initialized");

    let state = AppState {
        db,
        page_source,
        agents,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // any-origin by contract

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
