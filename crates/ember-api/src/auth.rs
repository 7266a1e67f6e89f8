use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};

use ember_db::Database;
use ember_types::api::ProfileResponse;
use ember_types::models::{Language, TelegramUser};

use crate::error::ApiError;
use crate::users::profile_from_row;

pub type AppState = Arc<AppStateInner>;

/// Shared state injected into every handler. Holding the store here (rather
/// than a process-wide handle) is what lets tests run the real router
/// against an in-memory database.
pub struct AppStateInner {
    pub db: Database,
    pub bot_token: String,
}

/// POST /api/auth/login — upsert the verified caller as a user row and
/// return the full profile. Re-login only touches `updated_at`.
pub async fn login(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
) -> Result<impl IntoResponse, ApiError> {
    let language = Language::from_code(tg.language_code.as_deref());
    let row = state.db.upsert_login_user(
        tg.id,
        tg.first_name.as_deref().unwrap_or(""),
        tg.username.as_deref().unwrap_or(""),
        language.as_str(),
    )?;

    Ok(Json(ProfileResponse {
        success: true,
        user: profile_from_row(row),
    }))
}
