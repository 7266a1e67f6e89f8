use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::warn;

use ember_db::Database;
use ember_db::models::{MatchPartnerRow, MatchRow};
use ember_types::api::{
    ConfirmMatchRequest, ConfirmMatchResponse, DeclineMatchRequest, MatchListResponse,
    MatchSummary, PendingListResponse, PendingSummary, StatusResponse,
};
use ember_types::models::{MatchKind, TelegramUser};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::users::parse_photos;

/// Fetch a match and check the caller belongs to it: 404 for an unknown id,
/// 403 for a stranger.
pub(crate) fn load_member_match(
    db: &Database,
    match_id: i64,
    user_id: i64,
) -> Result<MatchRow, ApiError> {
    let m = db
        .get_match(match_id)?
        .ok_or_else(|| ApiError::NotFound("Match not found".into()))?;
    if !m.is_member(user_id) {
        return Err(ApiError::Forbidden("Access denied".into()));
    }
    Ok(m)
}

fn summary(row: MatchPartnerRow, user_id: i64) -> MatchSummary {
    let mine_is_first = row.user1_id == user_id;
    let partner_id = if mine_is_first { row.user2_id } else { row.user1_id };
    let kind = MatchKind::from_db(&row.kind).unwrap_or_else(|| {
        warn!("Corrupt match type '{}' on match {}", row.kind, row.id);
        MatchKind::Conditional
    });
    MatchSummary {
        id: row.id,
        partner_id,
        partner_name: if mine_is_first { row.user2_name } else { row.user1_name },
        partner_photos: parse_photos(
            if mine_is_first { &row.user2_photos } else { &row.user1_photos },
            partner_id,
        ),
        kind,
        created_at: row.created_at,
    }
}

fn pending_summary(row: MatchPartnerRow, user_id: i64) -> PendingSummary {
    let mine_is_first = row.user1_id == user_id;
    let partner_id = if mine_is_first { row.user2_id } else { row.user1_id };
    PendingSummary {
        id: row.id,
        partner_id,
        partner_name: if mine_is_first { row.user2_name } else { row.user1_name },
        partner_photos: parse_photos(
            if mine_is_first { &row.user2_photos } else { &row.user1_photos },
            partner_id,
        ),
        my_confirmed: if mine_is_first { row.confirm_1 } else { row.confirm_2 },
        partner_confirmed: if mine_is_first { row.confirm_2 } else { row.confirm_1 },
        created_at: row.created_at,
    }
}

/// GET /api/match/list — active chats, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let user_id = tg.id;
    let rows = tokio::task::spawn_blocking(move || db_state.db.list_active_matches(user_id))
        .await
        .map_err(join_error)??;

    Ok(Json(MatchListResponse {
        matches: rows.into_iter().map(|row| summary(row, tg.id)).collect(),
    }))
}

/// GET /api/match/pending — conditional matches awaiting confirmation, seen
/// from the caller's side.
pub async fn pending(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let user_id = tg.id;
    let rows = tokio::task::spawn_blocking(move || db_state.db.list_pending_matches(user_id))
        .await
        .map_err(join_error)??;

    Ok(Json(PendingListResponse {
        pending: rows.into_iter().map(|row| pending_summary(row, tg.id)).collect(),
    }))
}

/// POST /api/match/confirm — set the caller's own confirmation flag.
/// Confirming an already-confirmed side is a no-op.
pub async fn confirm(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
    Json(req): Json<ConfirmMatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let m = load_member_match(&state.db, req.match_id, tg.id)?;

    let updated = state
        .db
        .confirm_member(req.match_id, m.user1_id == tg.id)?
        .ok_or_else(|| ApiError::NotFound("Match not found".into()))?;

    let both_confirmed = updated.both_confirmed();
    Ok(Json(ConfirmMatchResponse {
        success: true,
        both_confirmed,
        message: if both_confirmed {
            "Chat is open!"
        } else {
            "Waiting for partner confirmation"
        }
        .to_string(),
    }))
}

/// POST /api/match/decline — remove the match outright. Applies to any
/// match the caller belongs to, pending or active; messages go with it.
pub async fn decline(
    State(state): State<AppState>,
    Extension(tg): Extension<TelegramUser>,
    Json(req): Json<DeclineMatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    load_member_match(&state.db, req.match_id, tg.id)?;
    state.db.delete_match(req.match_id)?;

    Ok(Json(StatusResponse {
        success: true,
        message: "Match declined".to_string(),
    }))
}
