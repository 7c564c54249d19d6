//! Profile summary orchestration: read-through against the stored summary
//! blob, regeneration via the summary agent, and the fire-and-forget
//! generation task dispatched from profile creation.

use serde_json::Value;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::agents::strip_response_decorations;
use crate::errors::AppError;
use crate::models::page::UserPageRow;
use crate::models::profile::UserProfileRow;
use crate::page_source::PageSource;
use crate::pages::sync::{stored_pages_for_user, sync_pages_for_user};
use crate::profile::normalize::{process_profile_response, ProcessedProfileSummary};
use crate::state::AppState;
use crate::templates;

/// Most pages fed into a single summary prompt.
const MAX_SUMMARY_PAGES: usize = 5;

/// Stock avatar for profiles created implicitly by a summary request.
pub const DEFAULT_PROFILE_IMG: &str =
    "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=300&h=300&fit=crop&crop=face";

pub(crate) async fn fetch_live_profile(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, UserProfileRow>(
        "SELECT * FROM user_profile WHERE user_email = $1 AND deleted_at IS NULL ORDER BY id LIMIT 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Returns the profile summary for an email.
///
/// Unless a sync is forced, a stored non-empty summary blob short-circuits
/// the agent call: it is re-normalized and returned as-is. Otherwise the
/// summary is regenerated, the pre-normalization map is persisted, and the
/// normalized result returned. Agent or parse failures are hard failures.
pub async fn profile_summary(
    state: &AppState,
    email: &str,
    sync: bool,
) -> Result<ProcessedProfileSummary, AppError> {
    if !sync {
        if let Some(profile) = fetch_live_profile(&state.db, email).await? {
            if !profile.ai_summary.is_empty() {
                match serde_json::from_str::<Value>(&profile.ai_summary) {
                    Ok(stored) => return Ok(process_profile_response(&stored)),
                    // A corrupt blob falls through to regeneration.
                    Err(e) => warn!("stored summary for {email} failed to parse: {e}"),
                }
            }
        }
    }

    let (raw, processed) = generate_summary(state, email).await?;

    let blob = serde_json::to_string(&raw).map_err(|e| AppError::Internal(e.into()))?;
    save_summary_blob(&state.db, email, &blob).await?;

    Ok(processed)
}

/// Fire-and-forget summary generation dispatched from profile creation.
/// Failures are logged and swallowed; delivery is best-effort by design.
pub fn spawn_summary_generation(state: AppState, email: String) {
    tokio::spawn(async move {
        match generate_and_save_summary(&state, &email).await {
            Ok(()) => info!("generated and saved profile summary for {email}"),
            Err(e) => error!("background summary generation for {email} failed: {e}"),
        }
    });
}

async fn generate_and_save_summary(state: &AppState, email: &str) -> Result<(), AppError> {
    let (_, processed) = generate_summary(state, email).await?;
    let blob = serde_json::to_string(&processed).map_err(|e| AppError::Internal(e.into()))?;
    save_summary_blob(&state.db, email, &blob).await?;
    Ok(())
}

/// Calls the summary agent for a user and returns the raw pre-normalization
/// map together with its normalized form.
async fn generate_summary(
    state: &AppState,
    email: &str,
) -> Result<(Value, ProcessedProfileSummary), AppError> {
    let pages = summary_pages(&state.db, state.page_source.as_ref(), email).await?;
    let page_ids = joined_page_ids(&pages);

    let template =
        templates::template_content_by_type(&state.db, templates::PROFILE_SUMMARY_TEMPLATE_TYPE)
            .await?
            .unwrap_or_default();

    let answer = state
        .agents
        .run_summary(&page_ids, &template, email)
        .await
        .map_err(|e| AppError::Agent(format!("failed to get AI response for {email}: {e}")))?;

    let text = answer.response_text().unwrap_or_default();
    let cleaned = strip_response_decorations(text);

    let raw: Value = serde_json::from_str(cleaned).map_err(|e| {
        AppError::Agent(format!("failed to parse AI response for {email}: {e}"))
    })?;
    if !raw.is_object() {
        return Err(AppError::Agent(format!(
            "AI response for {email} is not a JSON object"
        )));
    }

    let processed = process_profile_response(&raw);
    Ok((raw, processed))
}

/// Loads the prompt input for a user: up to the five newest stored pages,
/// syncing from the page source first when nothing is stored yet.
async fn summary_pages(
    pool: &PgPool,
    source: &dyn PageSource,
    email: &str,
) -> Result<Vec<UserPageRow>, AppError> {
    let mut pages = stored_pages_for_user(pool, email).await?;
    if pages.is_empty() {
        pages = sync_pages_for_user(pool, source, email, false).await?;
    }
    pages.truncate(MAX_SUMMARY_PAGES);
    Ok(pages)
}

fn joined_page_ids(pages: &[UserPageRow]) -> String {
    pages
        .iter()
        .map(|p| p.page_id.as_str())
        .filter(|id| !id.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Writes the summary blob, creating the profile if none exists yet.
async fn save_summary_blob(pool: &PgPool, email: &str, blob: &str) -> Result<(), sqlx::Error> {
    let updated = sqlx::query(
        "UPDATE user_profile SET ai_summary = $2, last_updated = now() WHERE user_email = $1 AND deleted_at IS NULL",
    )
    .bind(email)
    .bind(blob)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        sqlx::query(
            "INSERT INTO user_profile (user_email, user_name, profile_img, ai_summary) VALUES ($1, $1, $2, $3)",
        )
        .bind(email)
        .bind(DEFAULT_PROFILE_IMG)
        .bind(blob)
        .execute(pool)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn page(page_id: &str, timestamp: i64) -> UserPageRow {
        UserPageRow {
            id: 1,
            user_email: "dev@example.com".to_string(),
            page_id: page_id.to_string(),
            page_type: "page".to_string(),
            page_title: "t".to_string(),
            page_content: String::new(),
            page_link: String::new(),
            page_timestamp: timestamp,
            created_at: Utc::now(),
            last_updated: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_joined_page_ids_skips_empty_ids() {
        let pages = vec![page("101", 3), page("", 2), page("102", 1)];
        assert_eq!(joined_page_ids(&pages), "101,102");
    }

    #[test]
    fn test_joined_page_ids_empty_list() {
        assert_eq!(joined_page_ids(&[]), "");
    }
}
