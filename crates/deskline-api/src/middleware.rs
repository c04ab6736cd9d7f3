use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the Bearer token to an active user and attach its `UserProfile`
/// to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Access token required", "TOKEN_REQUIRED"))?;

    let user = state.sessions.verify(token).await.map_err(|e| {
        warn!("Authentication failed: {}", e);
        ApiError::unauthorized("Invalid or expired token", "TOKEN_INVALID")
    })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
