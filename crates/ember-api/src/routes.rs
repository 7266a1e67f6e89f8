use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{actions, chat, matches, users};

/// Build the full API router over injected state. `/health` is public;
/// everything under `/api` goes through the init-data verifier.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/user/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/api/user/add-photo", post(users::add_photo))
        .route("/api/user/next", get(users::next_candidate))
        .route("/api/action/submit", post(actions::submit))
        .route("/api/match/list", get(matches::list))
        .route("/api/match/pending", get(matches::pending))
        .route("/api/match/confirm", post(matches::confirm))
        .route("/api/match/decline", post(matches::decline))
        .route("/api/chat/{match_id}/messages", get(chat::get_messages))
        .route("/api/chat/{match_id}/message", post(chat::send_message))
        .route(
            "/api/chat/{match_id}/toggle-blur/{message_id}",
            post(chat::toggle_blur),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        .with_state(state);

    Router::new().route("/health", get(health)).merge(protected)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
