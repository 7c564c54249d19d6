//! Prompt template lookup. Templates are stored rows keyed by type and feed
//! the summary agent; a missing template is not an error.

use sqlx::PgPool;

pub const PROFILE_SUMMARY_TEMPLATE_TYPE: &str = "profile_summary";

/// Returns the live template body for a type, if one is stored.
pub async fn template_content_by_type(
    pool: &PgPool,
    template_type: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT template_content FROM templates WHERE template_type = $1 AND deleted_at IS NULL ORDER BY id LIMIT 1",
    )
    .bind(template_type)
    .fetch_optional(pool)
    .await
}
