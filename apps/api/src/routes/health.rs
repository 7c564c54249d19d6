use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::models::StatusMessage;
use crate::state::AppState;

/// GET /
pub async fn root_handler() -> Json<StatusMessage> {
    Json(StatusMessage::success("Welcome to the Team Knowledge API"))
}

/// GET /hello
pub async fn hello_handler() -> Json<StatusMessage> {
    Json(StatusMessage::success("Hello, World!"))
}

/// GET /health — reports store reachability alongside liveness.
pub async fn health_handler(State(state): State<AppState>) -> Json<StatusMessage> {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::error!("health check query failed: {e}");
            "unhealthy"
        }
    };

    Json(StatusMessage {
        message: format!("Service is {db_status}"),
        timestamp: Utc::now(),
        status: db_status.to_string(),
    })
}
