use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::profile::UserProfileRow;
use crate::models::StatusMessage;
use crate::profile::normalize::ProcessedProfileSummary;
use crate::profile::summary::{fetch_live_profile, profile_summary, spawn_summary_generation};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub profile_img: String,
    #[serde(default)]
    pub ai_summary: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub profile_img: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub email: Option<String>,
    pub sync: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub data: UserProfileRow,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub data: Vec<UserProfileRow>,
    pub count: usize,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileSummaryResponse {
    pub data: ProcessedProfileSummary,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn require_email(email: Option<String>) -> Result<String, AppError> {
    email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("email parameter is required".to_string()))
}

/// GET /get_profile_summary?email=<email>&sync=<bool>
pub async fn handle_profile_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryQuery>,
) -> Result<Json<ProfileSummaryResponse>, AppError> {
    let email = require_email(params.email)?;
    let sync = params.sync.as_deref() == Some("true");

    let data = profile_summary(&state, &email, sync).await?;
    Ok(Json(ProfileSummaryResponse {
        data,
        timestamp: Utc::now(),
        error: None,
    }))
}

/// POST /user/profile
///
/// Creates a profile, or updates name/image on an existing one. Either way a
/// profile without a stored summary gets one generated in the background.
pub async fn handle_create_profile(
    State(state): State<AppState>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), AppError> {
    if req.user_email.is_empty() {
        return Err(AppError::Validation("user_email is required".to_string()));
    }
    if req.user_name.is_empty() {
        return Err(AppError::Validation("user_name is required".to_string()));
    }
    if req.profile_img.is_empty() {
        return Err(AppError::Validation("profile_img is required".to_string()));
    }

    if let Some(existing) = fetch_live_profile(&state.db, &req.user_email).await? {
        // Plain field edits must not clobber a stored summary.
        let updated = sqlx::query_as::<_, UserProfileRow>(
            "UPDATE user_profile SET user_name = $2, profile_img = $3, last_updated = now() WHERE id = $1 RETURNING *",
        )
        .bind(existing.id)
        .bind(&req.user_name)
        .bind(&req.profile_img)
        .fetch_one(&state.db)
        .await?;

        if updated.ai_summary.is_empty() {
            spawn_summary_generation(state.clone(), updated.user_email.clone());
        }

        return Ok((
            StatusCode::OK,
            Json(ProfileResponse {
                data: updated,
                message: "User profile updated successfully".to_string(),
                timestamp: Utc::now(),
                status: "success".to_string(),
            }),
        ));
    }

    let created = sqlx::query_as::<_, UserProfileRow>(
        "INSERT INTO user_profile (user_email, user_name, profile_img, ai_summary) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(&req.user_email)
    .bind(&req.user_name)
    .bind(&req.profile_img)
    .bind(&req.ai_summary)
    .fetch_one(&state.db)
    .await?;

    spawn_summary_generation(state.clone(), created.user_email.clone());

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse {
            data: created,
            message: "User profile created successfully".to_string(),
            timestamp: Utc::now(),
            status: "success".to_string(),
        }),
    ))
}

/// GET /user/profile/get?email=<email>
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<EmailQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let email = require_email(params.email)?;

    let profile = fetch_live_profile(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    Ok(Json(ProfileResponse {
        data: profile,
        message: "User profile retrieved successfully".to_string(),
        timestamp: Utc::now(),
        status: "success".to_string(),
    }))
}

/// PUT /user/profile/update
///
/// Updates display fields only; the stored summary blob is preserved.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if req.user_email.is_empty() {
        return Err(AppError::Validation("user_email is required".to_string()));
    }

    let existing = fetch_live_profile(&state.db, &req.user_email)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    // Empty fields keep their stored values.
    let updated = sqlx::query_as::<_, UserProfileRow>(
        r#"
        UPDATE user_profile SET
            user_name = CASE WHEN $2 = '' THEN user_name ELSE $2 END,
            profile_img = CASE WHEN $3 = '' THEN profile_img ELSE $3 END,
            last_updated = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(existing.id)
    .bind(&req.user_name)
    .bind(&req.profile_img)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(ProfileResponse {
        data: updated,
        message: "User profile updated successfully".to_string(),
        timestamp: Utc::now(),
        status: "success".to_string(),
    }))
}

/// DELETE /user/profile/delete?email=<email>
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Query(params): Query<EmailQuery>,
) -> Result<Json<StatusMessage>, AppError> {
    let email = require_email(params.email)?;

    let existing = fetch_live_profile(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    sqlx::query("UPDATE user_profile SET deleted_at = now() WHERE id = $1")
        .bind(existing.id)
        .execute(&state.db)
        .await?;

    Ok(Json(StatusMessage::success(
        "User profile deleted successfully",
    )))
}

/// GET /user/profile/list?limit=&offset=
pub async fn handle_list_profiles(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ProfileListResponse>, AppError> {
    let limit = match params.limit.as_deref().filter(|l| !l.is_empty()) {
        Some(raw) => {
            let parsed: i64 = raw.parse().map_err(|_| {
                AppError::Validation(
                    "Invalid limit parameter. Must be a valid integer".to_string(),
                )
            })?;
            if parsed <= 0 {
                return Err(AppError::Validation(
                    "Limit must be greater than 0".to_string(),
                ));
            }
            Some(parsed)
        }
        None => None,
    };

    let offset = match params.offset.as_deref().filter(|o| !o.is_empty()) {
        Some(raw) => {
            let parsed: i64 = raw.parse().map_err(|_| {
                AppError::Validation(
                    "Invalid offset parameter. Must be a valid integer".to_string(),
                )
            })?;
            if parsed < 0 {
                return Err(AppError::Validation(
                    "Offset must be greater than or equal to 0".to_string(),
                ));
            }
            parsed
        }
        None => 0,
    };

    // LIMIT NULL means no limit.
    let profiles = sqlx::query_as::<_, UserProfileRow>(
        "SELECT * FROM user_profile WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ProfileListResponse {
        count: profiles.len(),
        data: profiles,
        message: "User profiles retrieved successfully".to_string(),
        timestamp: Utc::now(),
        status: "success".to_string(),
    }))
}
