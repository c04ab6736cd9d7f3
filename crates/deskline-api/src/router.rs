use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use serde_json::json;
use tracing::warn;

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{agent, auth, conversations, tenants, ws};

/// Every HTTP route plus the `/gateway` WebSocket handshake.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/gateway", get(ws::upgrade))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh-token", post(auth::refresh_token))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password));

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/profile", get(auth::profile))
        .route("/api/tenants", post(tenants::create_tenant))
        .route("/api/tenants/{tenant_id}", get(tenants::get_tenant))
        .route(
            "/api/chat/conversations",
            post(conversations::create_conversation),
        )
        .route(
            "/api/chat/tenants/{tenant_id}/conversations",
            get(conversations::list_conversations),
        )
        .route(
            "/api/chat/tenants/{tenant_id}/stats",
            get(conversations::conversation_stats),
        )
        .route(
            "/api/chat/conversations/{id}",
            get(conversations::get_conversation).delete(conversations::delete_conversation),
        )
        .route(
            "/api/chat/conversations/{id}/status",
            patch(conversations::update_status),
        )
        .route(
            "/api/chat/conversations/{id}/messages",
            get(conversations::list_messages).post(conversations::send_message),
        )
        .route("/api/agent/chat", post(agent::chat))
        .route(
            "/api/agent/knowledge/{tenant_id}",
            post(agent::add_knowledge).get(agent::list_knowledge),
        )
        .route(
            "/api/agent/knowledge/{tenant_id}/{id}",
            put(agent::update_knowledge).delete(agent::delete_knowledge),
        )
        .route("/api/agent/analyze", post(agent::analyze))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.db.clone();
    let database = tokio::task::spawn_blocking(move || db.health_check())
        .await
        .unwrap_or(false);
    let kv = match state.kv.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Key-value store ping failed: {}", e);
            false
        }
    };

    let healthy = database && kv;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "degraded" },
            "database": database,
            "kv": kv,
            "ai": state.assistant.is_configured(),
            "connections": state.gateway.dispatcher().connection_count().await,
            "timestamp": chrono::Utc::now(),
        })),
    )
}
