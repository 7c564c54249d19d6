use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;
use crate::models::page::UserPageRow;
use crate::page_source::{PageSource, RemotePage};

/// Live pages for a contributor as stored, newest page id first.
pub async fn stored_pages_for_user(
    pool: &PgPool,
    email: &str,
) -> Result<Vec<UserPageRow>, sqlx::Error> {
    sqlx::query_as::<_, UserPageRow>(
        "SELECT * FROM user_page WHERE user_email = $1 AND deleted_at IS NULL ORDER BY page_id DESC",
    )
    .bind(email)
    .fetch_all(pool)
    .await
}

/// Refreshes a contributor's pages from the page source and upserts them
/// keyed by the external page id. A page that fails to upsert is skipped.
/// Returns the synced rows, newest first.
///
/// `with_content` additionally pulls each page's full body, which is slower
/// by one request per page.
pub async fn sync_pages_for_user(
    pool: &PgPool,
    source: &dyn PageSource,
    email: &str,
    with_content: bool,
) -> Result<Vec<UserPageRow>, AppError> {
    let remote = if with_content {
        source.pages_by_contributor_with_content(email).await
    } else {
        source.pages_by_contributor(email).await
    }
    .map_err(|e| AppError::PageSource(format!("failed to fetch pages for {email}: {e}")))?;

    let mut rows = Vec::with_capacity(remote.len());
    for page in &remote {
        match upsert_page(pool, email, page).await {
            Ok(row) => rows.push(row),
            Err(e) => {
                error!("error upserting page {}: {e}", page.id);
                continue;
            }
        }
    }

    rows.sort_by(|a, b| b.page_timestamp.cmp(&a.page_timestamp));
    Ok(rows)
}

/// Upsert by `page_id`: a second sync of the same page overwrites its fields
/// instead of duplicating the row, and revives a soft-deleted one.
async fn upsert_page(
    pool: &PgPool,
    email: &str,
    page: &RemotePage,
) -> Result<UserPageRow, sqlx::Error> {
    sqlx::query_as::<_, UserPageRow>(
        r#"
        INSERT INTO user_page
            (user_email, page_id, page_type, page_title, page_content, page_link, page_timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (page_id) DO UPDATE SET
            user_email = EXCLUDED.user_email,
            page_type = EXCLUDED.page_type,
            page_title = EXCLUDED.page_title,
            page_content = EXCLUDED.page_content,
            page_link = EXCLUDED.page_link,
            page_timestamp = EXCLUDED.page_timestamp,
            last_updated = now(),
            deleted_at = NULL
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(&page.id)
    .bind(&page.page_type)
    .bind(&page.title)
    .bind(&page.content)
    .bind(&page.link)
    .bind(page.timestamp)
    .fetch_one(pool)
    .await
}
