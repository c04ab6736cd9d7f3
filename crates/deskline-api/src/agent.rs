use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use deskline_types::api::{AddKnowledgeRequest, AgentChatRequest, AnalyzeRequest, PageQuery};
use deskline_types::models::KnowledgePatch;

use crate::conversations::paging;
use crate::error::ApiError;
use crate::state::AppState;
use crate::tenants::ensure_tenant;
use crate::validation::Validator;

const KNOWLEDGE_PER_PAGE: u32 = 20;

/// One-off assistant answer for a tenant. Provider failures still answer
/// 200 with the fallback message.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<AgentChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new()
        .required("message", &req.message, "Message is required")
        .required("clientId", &req.client_id, "Client ID is required")
        .finish()?;

    let history = req.conversation_history.unwrap_or_default();
    let outcome = state
        .assistant
        .generate_response(&req.message, &req.client_id, &history)
        .await;
    if let deskline_ai::Outcome::Fallback { reason, .. } = &outcome {
        warn!("Agent chat answered with fallback: {}", reason);
    }

    Ok(Json(json!({
        "success": true,
        "data": { "response": outcome.into_inner() },
    })))
}

pub async fn add_knowledge(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Json(req): Json<AddKnowledgeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new()
        .required("title", &req.title, "Title is required")
        .required("content", &req.content, "Content is required")
        .finish()?;
    ensure_tenant(&state, &tenant_id).await?;

    let item = deskline_db::blocking(&state.db, move |db| {
        db.add_knowledge(
            &tenant_id,
            req.title.trim(),
            &req.content,
            req.kind,
            req.source.as_deref().filter(|s| !s.is_empty()),
        )
    })
    .await
    .map_err(ApiError::store("Failed to add knowledge", "ADD_KNOWLEDGE_ERROR"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Knowledge added successfully",
            "data": { "knowledge": item },
        })),
    ))
}

pub async fn list_knowledge(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = paging(&query, KNOWLEDGE_PER_PAGE);
    let listed = deskline_db::blocking(&state.db, move |db| {
        db.list_knowledge(&tenant_id, page, limit)
    })
    .await
    .map_err(ApiError::store("Failed to get knowledge", "GET_KNOWLEDGE_ERROR"))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "knowledge": listed.items,
            "pagination": listed.pagination,
        },
    })))
}

pub async fn update_knowledge(
    State(state): State<AppState>,
    Path((tenant_id, id)): Path<(String, Uuid)>,
    Json(patch): Json<KnowledgePatch>,
) -> Result<impl IntoResponse, ApiError> {
    let item = deskline_db::blocking(&state.db, move |db| {
        db.update_knowledge(id, &tenant_id, &patch)
    })
    .await
    .map_err(ApiError::store(
        "Failed to update knowledge",
        "UPDATE_KNOWLEDGE_ERROR",
    ))?;

    Ok(Json(json!({
        "success": true,
        "message": "Knowledge updated successfully",
        "data": { "knowledge": item },
    })))
}

pub async fn delete_knowledge(
    State(state): State<AppState>,
    Path((tenant_id, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    deskline_db::blocking(&state.db, move |db| db.delete_knowledge(id, &tenant_id))
        .await
        .map_err(ApiError::store(
            "Failed to delete knowledge",
            "DELETE_KNOWLEDGE_ERROR",
        ))?;

    Ok(Json(json!({
        "success": true,
        "message": "Knowledge deleted successfully",
    })))
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.messages.is_empty() {
        return Err(ApiError::BadRequest {
            message: "At least one message is required".into(),
            code: "VALIDATION_ERROR",
        });
    }

    let analysis = state
        .assistant
        .analyze_conversation(&req.messages)
        .await
        .into_inner();

    Ok(Json(json!({
        "success": true,
        "data": { "analysis": analysis },
    })))
}
