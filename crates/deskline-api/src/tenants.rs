use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use deskline_types::api::CreateTenantRequest;
use deskline_types::models::UserProfile;

use crate::error::{ApiError, not_found};
use crate::state::AppState;
use crate::validation::Validator;

/// Create a tenant owned by the calling user.
pub async fn create_tenant(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Json(req): Json<CreateTenantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new()
        .name("name", &req.name)
        .finish()?;

    let name = req.name.trim().to_string();
    let domain = req.domain.filter(|d| !d.trim().is_empty());
    let tenant = deskline_db::blocking(&state.db, move |db| {
        db.create_tenant(&name, domain.as_deref(), user.id)
    })
    .await
    .map_err(ApiError::store("Failed to create client", "CREATE_CLIENT_ERROR"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Client created successfully",
            "data": { "client": tenant },
        })),
    ))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = deskline_db::blocking(&state.db, move |db| db.get_tenant(&tenant_id))
        .await
        .map_err(ApiError::store("Failed to get client", "GET_CLIENT_ERROR"))?
        .ok_or_else(|| not_found("client"))?;

    Ok(Json(json!({
        "success": true,
        "data": { "client": tenant },
    })))
}

/// 404 unless the tenant exists. Used before writes that reference one.
pub(crate) async fn ensure_tenant(state: &AppState, tenant_id: &str) -> Result<(), ApiError> {
    let tenant_id = tenant_id.to_string();
    deskline_db::blocking(&state.db, move |db| db.get_tenant(&tenant_id))
        .await
        .map_err(ApiError::store("Failed to get client", "GET_CLIENT_ERROR"))?
        .map(|_| ())
        .ok_or_else(|| not_found("client"))
}
