use axum::{
    extract::{Query, State, WebSocketUpgrade, ws::rejection::WebSocketUpgradeRejection},
    response::{IntoResponse, Response},
};
use tracing::warn;

use deskline_gateway::connection;
use deskline_types::api::GatewayParams;

use crate::error::ApiError;
use crate::state::AppState;

/// Validate the handshake before upgrading: a tenant id is required, and a
/// token, when present, must verify. The upgrade itself is checked last so
/// handshake errors win over a malformed upgrade request.
pub async fn upgrade(
    State(state): State<AppState>,
    Query(params): Query<GatewayParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let tenant_id = params
        .tenant_id
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest {
            message: "tenantId is required".into(),
            code: "TENANT_REQUIRED",
        })?;

    let user_id = match params.token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => {
            let user = state.sessions.verify(token).await.map_err(|e| {
                warn!("Gateway handshake rejected: {}", e);
                ApiError::unauthorized("Invalid or expired token", "TOKEN_INVALID")
            })?;
            Some(user.id)
        }
        None => None,
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let gateway = state.gateway.clone();
    Ok(ws
        .on_upgrade(move |socket| {
            connection::handle_connection(socket, gateway, tenant_id, user_id)
        })
        .into_response())
}
