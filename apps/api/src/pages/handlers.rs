use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::page::PageInfo;
use crate::pages::sync::{stored_pages_for_user, sync_pages_for_user};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PagesQuery {
    pub contributor: Option<String>,
    pub sync: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PagesResponse {
    pub pages: Vec<PageInfo>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

/// GET /pages/user?contributor=<email>&sync=<bool>&content=<bool>
pub async fn handle_pages_by_user(
    State(state): State<AppState>,
    Query(params): Query<PagesQuery>,
) -> Result<Json<PagesResponse>, AppError> {
    let email = params
        .contributor
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("contributor parameter is required".to_string()))?;
    let sync = params.sync.as_deref() == Some("true");
    let with_content = params.content.as_deref() == Some("true");

    let rows = if sync {
        sync_pages_for_user(&state.db, state.page_source.as_ref(), &email, with_content).await?
    } else {
        stored_pages_for_user(&state.db, &email).await?
    };

    let pages: Vec<PageInfo> = rows.iter().map(PageInfo::from).collect();
    Ok(Json(PagesResponse {
        count: pages.len(),
        pages,
        timestamp: Utc::now(),
        status: "success".to_string(),
    }))
}
