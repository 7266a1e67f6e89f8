use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::warn;

use ember_db::models::{AddPhotoOutcome, ProfileUpdate, UserRow};
use ember_types::api::{
    AddPhotoRequest, AddPhotoResponse, NextResponse, Profile, ProfileResponse,
    UpdateProfileRequest,
};
use ember_types::models::{Language, MAX_DESCRIPTION_CHARS, MAX_PHOTOS, TelegramUser, Theme};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};

pub(crate) fn parse_photos(raw: &str, owner: i64) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Corrupt photos column for user {}: {}", owner, e);
        Vec::new()
    })
}

pub(crate) fn profile_from_row(row: UserRow) -> Profile {
    let photos = parse_photos(&row.photos, row.telegram_user_id);
    Profile {
        telegram_user_id: row.telegram_user_id,
        first_name: row.first_name,
        username: row.username,
        photos,
        description: row.description,
        language: Language::from_db(&row.language),
        theme: Theme::from_db(&row.theme),
        film_grain: row.film_grain,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// GET /api/user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_user(tg.id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(profile_from_row(row)))
}

/// PUT /api/user/profile — partial update with one validation rule per
/// field: photos capped at 5, description truncated at 300 chars, language
/// and theme constrained to their enums at deserialization.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = ProfileUpdate {
        photos: req.photos.map(|mut photos| {
            photos.truncate(MAX_PHOTOS);
            photos
        }),
        description: req.description.map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS)),
        language: req.language.map(|l| l.as_str().to_string()),
        theme: req.theme.map(|t| t.as_str().to_string()),
        film_grain: req.film_grain,
    };

    let row = state
        .db
        .update_profile(tg.id, &update)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ProfileResponse {
        success: true,
        user: profile_from_row(row),
    }))
}

/// POST /api/user/add-photo — append one photo, server-side cap of 5.
pub async fn add_photo(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
    Json(req): Json<AddPhotoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.photo_url.trim().is_empty() {
        return Err(ApiError::Validation("Photo URL required".into()));
    }

    match state.db.add_photo(tg.id, &req.photo_url)? {
        AddPhotoOutcome::Added(photos) => Ok(Json(AddPhotoResponse {
            success: true,
            photos,
        })),
        AddPhotoOutcome::CapReached => Err(ApiError::Validation(format!(
            "Maximum {} photos allowed",
            MAX_PHOTOS
        ))),
        AddPhotoOutcome::NoSuchUser => Err(ApiError::NotFound("User not found".into())),
    }
}

/// GET /api/user/next — random unseen candidate, or `null` when the pool
/// is exhausted.
pub async fn next_candidate(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let user_id = tg.id;
    let row = tokio::task::spawn_blocking(move || db_state.db.next_candidate(user_id))
        .await
        .map_err(join_error)??;

    Ok(Json(NextResponse {
        user: row.map(profile_from_row),
    }))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("hello", 300), "hello");
        assert_eq!(truncate_chars("héllo", 3), "hél");
        assert_eq!(truncate_chars(&"x".repeat(400), 300).len(), 300);
    }
}
