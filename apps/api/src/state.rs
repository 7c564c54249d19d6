use std::sync::Arc;

use sqlx::PgPool;

use crate::agents::AgentClient;
use crate::page_source::PageSource;

/// Shared application state injected into all route handlers via Axum extractors.
/// The page source rides behind a trait object so tests and alternative
/// backends can swap the wiki client without touching handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub page_source: Arc<dyn PageSource>,
    pub agents: AgentClient,
}
