use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::AppState;
use crate::error::ApiError;

pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Verify the signed init-data header and attach the caller identity to the
/// request. Everything under /api runs behind this.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw = req
        .headers()
        .get(INIT_DATA_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("No init data".into()))?;

    let user = ember_auth::verify_init_data(raw, &state.bot_token)
        .map_err(|e| ApiError::Unauthorized(format!("Invalid init data: {}", e)))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
