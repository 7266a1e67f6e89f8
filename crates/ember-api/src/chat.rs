use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::warn;

use ember_db::models::MessageRow;
use ember_types::api::{
    ChatMessage, MessagesResponse, SendMessageRequest, SendMessageResponse, ToggleBlurResponse,
};
use ember_types::models::{MessageKind, TelegramUser};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};
use crate::matches::load_member_match;

fn message_from_row(row: MessageRow) -> ChatMessage {
    let kind = MessageKind::from_db(&row.kind).unwrap_or_else(|| {
        warn!("Corrupt message type '{}' on message {}", row.kind, row.id);
        MessageKind::Text
    });
    ChatMessage {
        id: row.id,
        chat_id: row.chat_id,
        sender_id: row.sender_id,
        kind,
        content: row.content,
        blurred: row.blurred,
        timestamp: row.timestamp,
    }
}

/// GET /api/chat/{match_id}/messages — full thread, oldest first.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
    Extension(tg): Extension<TelegramUser>,
) -> Result<impl IntoResponse, ApiError> {
    load_member_match(&state.db, match_id, tg.id)?;

    let db_state = state.clone();
    let rows = tokio::task::spawn_blocking(move || db_state.db.messages_for_chat(match_id))
        .await
        .map_err(join_error)??;

    Ok(Json(MessagesResponse {
        messages: rows.into_iter().map(message_from_row).collect(),
    }))
}

/// POST /api/chat/{match_id}/message — append one message. Only the two
/// match members may post.
pub async fn send_message(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
    Extension(tg): Extension<TelegramUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = MessageKind::from_db(&req.kind)
        .ok_or_else(|| ApiError::Validation("Invalid message type".into()))?;

    load_member_match(&state.db, match_id, tg.id)?;

    let row = state
        .db
        .insert_message(match_id, tg.id, kind, &req.content, req.blurred)?;

    Ok(Json(SendMessageResponse {
        success: true,
        message: message_from_row(row),
    }))
}

/// POST /api/chat/{match_id}/toggle-blur/{message_id} — flip the reveal
/// flag; either member may toggle it.
pub async fn toggle_blur(
    State(state): State<AppState>,
    Path((match_id, message_id)): Path<(i64, i64)>,
    Extension(tg): Extension<TelegramUser>,
) -> Result<impl IntoResponse, ApiError> {
    load_member_match(&state.db, match_id, tg.id)?;

    let message = state
        .db
        .get_message_in_chat(message_id, match_id)?
        .ok_or_else(|| ApiError::NotFound("Message not found".into()))?;

    let blurred = !message.blurred;
    state.db.set_message_blurred(message_id, blurred)?;

    Ok(Json(ToggleBlurResponse {
        success: true,
        blurred,
    }))
}
