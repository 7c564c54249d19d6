use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user profile row. Logically unique per live `user_email`; `ai_summary`
/// holds the serialized agent output blob and survives plain field edits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfileRow {
    pub id: i32,
    pub user_email: String,
    pub user_name: String,
    pub profile_img: String,
    pub ai_summary: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}
