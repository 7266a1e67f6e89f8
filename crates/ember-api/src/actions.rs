use axum::{Extension, Json, extract::State, response::IntoResponse};

use ember_db::matching::{self, MatchDecision};
use ember_types::api::{SubmitActionRequest, SubmitActionResponse};
use ember_types::models::{ActionKind, MatchOutcome, TelegramUser};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};

/// POST /api/action/submit — record a directed action and report the match
/// outcome the resolver decided.
pub async fn submit(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
    Json(req): Json<SubmitActionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let action = ActionKind::from_db(&req.action)
        .ok_or_else(|| ApiError::Validation("Invalid action".into()))?;

    if req.to_user_id == tg.id {
        return Err(ApiError::Validation("Cannot action yourself".into()));
    }

    if state.db.get_user(req.to_user_id)?.is_none() {
        return Err(ApiError::NotFound("Target user not found".into()));
    }

    let db_state = state.clone();
    let (from, to) = (tg.id, req.to_user_id);
    let decision =
        tokio::task::spawn_blocking(move || matching::resolve_action(&db_state.db, from, to, action))
            .await
            .map_err(join_error)??;

    let response = match decision {
        MatchDecision::None => SubmitActionResponse {
            success: true,
            match_type: MatchOutcome::None,
            action: None,
            icon: None,
        },
        MatchDecision::Instant { action } => SubmitActionResponse {
            success: true,
            match_type: MatchOutcome::Instant,
            action: Some(action),
            icon: Some(
                match action {
                    ActionKind::Fuck => "🔥",
                    _ => "💍",
                }
                .to_string(),
            ),
        },
        MatchDecision::Conditional => SubmitActionResponse {
            success: true,
            match_type: MatchOutcome::Conditional,
            action: None,
            icon: Some("💬".to_string()),
        },
    };

    Ok(Json(response))
}
