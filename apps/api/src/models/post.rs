use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A comment on a post. Field names follow the frontend's camelCase contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(rename = "authorName")]
    pub author_name: String,
    #[serde(rename = "authorImg", default)]
    pub author_img: String,
    pub content: String,
    pub timestamp: i64,
    #[serde(default)]
    pub likes: i32,
}

/// Tags and comments, stored together as one JSONB blob on the post row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

/// A user post row. `post_id` is a generated numeric string; `timestamp` is
/// epoch seconds at creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPostRow {
    pub post_id: String,
    pub post_type: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "authorName")]
    pub author_name: String,
    #[serde(rename = "authorImg")]
    pub author_image: String,
    pub author_id: String,
    pub timestamp: i64,
    #[serde(rename = "metaData")]
    pub metadata: Json<PostMetadata>,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Request payload for creating or updating a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(rename = "type", default)]
    pub post_type: String,
    pub content: String,
    #[serde(rename = "authorName")]
    pub author_name: String,
    #[serde(rename = "authorImg", default)]
    pub author_image: String,
    #[serde(rename = "authorId", default)]
    pub author_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub likes: i32,
}

/// Response envelope for post operations.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<UserPostRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<UserPostRow>>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_post_request_accepts_minimal_body() {
        let json = r#"{
            "title": "Deploy checklist",
            "content": "What is missing?",
            "authorName": "Mira"
        }"#;
        let req: CreatePostRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.title, "Deploy checklist");
        assert_eq!(req.post_type, "");
        assert_eq!(req.author_id, "");
        assert!(req.tags.is_empty());
        assert!(req.comments.is_empty());
        assert_eq!(req.likes, 0);
    }

    #[test]
    fn test_comment_round_trips_camel_case_keys() {
        let comment = Comment {
            id: "comment_1".to_string(),
            author_name: "Mira".to_string(),
            author_img: "https://example.com/a.png".to_string(),
            content: "nice".to_string(),
            timestamp: 1_700_000_000,
            likes: 3,
        };
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["authorName"], "Mira");
        assert_eq!(json["authorImg"], "https://example.com/a.png");

        let back: Comment = serde_json::from_value(json).unwrap();
        assert_eq!(back, comment);
    }

    #[test]
    fn test_post_metadata_omits_empty_collections() {
        let json = serde_json::to_value(PostMetadata::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
