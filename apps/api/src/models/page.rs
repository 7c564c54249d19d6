use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A wiki page owned by a contributor, as synced into the store.
/// At most one live row exists per external `page_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPageRow {
    pub id: i32,
    pub user_email: String,
    pub page_id: String,
    pub page_type: String,
    pub page_title: String,
    pub page_content: String,
    pub page_link: String,
    pub page_timestamp: i64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Trimmed page shape returned by the pages endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
}

impl From<&UserPageRow> for PageInfo {
    fn from(row: &UserPageRow) -> Self {
        PageInfo {
            id: row.page_id.clone(),
            page_type: row.page_type.clone(),
            title: row.page_title.clone(),
            content: row.page_content.clone(),
            link: row.page_link.clone(),
        }
    }
}
