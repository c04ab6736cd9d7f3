use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use uuid::Uuid;

use deskline_types::api::{
    CreateConversationRequest, Deleted, PageQuery, SendMessageRequest, TenantScope,
    UpdateStatusRequest,
};
use deskline_types::models::{NewMessage, SenderRole};

use crate::error::{ApiError, not_found};
use crate::state::AppState;
use crate::tenants::ensure_tenant;
use crate::validation::Validator;

pub const MAX_PAGE_SIZE: u32 = 100;
const CONVERSATIONS_PER_PAGE: u32 = 10;
const MESSAGES_PER_PAGE: u32 = 50;

/// Resolve `page`/`limit` from the query: zero or missing means the default,
/// limits are capped at `MAX_PAGE_SIZE`.
pub(crate) fn paging(query: &PageQuery, default_limit: u32) -> (u32, u32) {
    let page = query.page.filter(|p| *p > 0).unwrap_or(1);
    let limit = query
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(default_limit)
        .min(MAX_PAGE_SIZE);
    (page, limit)
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new()
        .required("clientId", &req.client_id, "Client ID is required")
        .finish()?;
    ensure_tenant(&state, &req.client_id).await?;

    let conversation = deskline_db::blocking(&state.db, move |db| {
        db.create_conversation(&req.client_id, req.channel, req.subject.as_deref())
    })
    .await
    .map_err(ApiError::store(
        "Failed to create conversation",
        "CREATE_CONVERSATION_ERROR",
    ))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Conversation created successfully",
            "data": { "conversation": conversation },
        })),
    ))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = paging(&query, CONVERSATIONS_PER_PAGE);
    let listed = deskline_db::blocking(&state.db, move |db| {
        db.list_conversations(&tenant_id, page, limit, query.search.as_deref())
    })
    .await
    .map_err(ApiError::store(
        "Failed to get conversations",
        "GET_CONVERSATIONS_ERROR",
    ))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "conversations": listed.items,
            "pagination": listed.pagination,
        },
    })))
}

pub async fn conversation_stats(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = deskline_db::blocking(&state.db, move |db| db.conversation_stats(&tenant_id))
        .await
        .map_err(ApiError::store("Failed to get stats", "GET_STATS_ERROR"))?;

    Ok(Json(json!({
        "success": true,
        "data": { "stats": stats },
    })))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(scope): Query<TenantScope>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = deskline_db::blocking(&state.db, move |db| {
        db.get_conversation(id, scope.client_id.as_deref())
    })
    .await
    .map_err(ApiError::store(
        "Failed to get conversation",
        "GET_CONVERSATION_ERROR",
    ))?;

    Ok(Json(json!({
        "success": true,
        "data": { "conversation": conversation },
    })))
}

/// Persist the new status, then tell the conversation room.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(scope): Query<TenantScope>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = deskline_db::blocking(&state.db, move |db| {
        db.update_status(id, req.status, scope.client_id.as_deref())
    })
    .await
    .map_err(ApiError::store(
        "Failed to update conversation status",
        "UPDATE_STATUS_ERROR",
    ))?;

    state.gateway.notify_status_change(&conversation).await;

    Ok(Json(json!({
        "success": true,
        "message": "Conversation status updated successfully",
        "data": { "conversation": conversation },
    })))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(scope): Query<TenantScope>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = deskline_db::blocking(&state.db, move |db| {
        db.delete_conversation(id, scope.client_id.as_deref())
    })
    .await
    .map_err(ApiError::store(
        "Failed to delete conversation",
        "DELETE_CONVERSATION_ERROR",
    ))?;

    // Deleting twice is not an error; `deleted` tells the caller which call won.
    let message = if deleted {
        "Conversation deleted successfully"
    } else {
        "Conversation already deleted"
    };
    let body = Deleted { id, deleted };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "data": body,
    })))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = paging(&query, MESSAGES_PER_PAGE);
    let listed = deskline_db::blocking(&state.db, move |db| {
        db.get_conversation(id, None)?;
        db.list_messages(id, page, limit)
    })
    .await
    .map_err(ApiError::store("Failed to get messages", "GET_MESSAGES_ERROR"))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "messages": listed.items,
            "pagination": listed.pagination,
        },
    })))
}

/// Append a message from the dashboard and push it to the conversation room.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new()
        .required("content", &req.content, "Message content is required")
        .optional_email("senderEmail", req.sender_email.as_deref())
        .finish()?;

    let message = NewMessage {
        content: req.content,
        kind: req.kind,
        sender: req.sender,
        sender_name: req.sender_name,
        sender_email: req.sender_email,
        is_from_ai: req.sender == SenderRole::Ai,
        attachments: req.attachments.map(Value::Array),
    };

    let message = state
        .gateway
        .send_operator_message(id, message)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                not_found("conversation")
            } else {
                ApiError::internal("Failed to send message", "SEND_MESSAGE_ERROR")(e)
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Message sent successfully",
            "data": { "message": message },
        })),
    ))
}
