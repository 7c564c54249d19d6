pub mod page;
pub mod post;
pub mod profile;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Minimal `{message, timestamp, status}` envelope shared by the liveness
/// endpoints and delete acknowledgements.
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
            status: "success".to_string(),
        }
    }
}
