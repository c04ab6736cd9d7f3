use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::{debug, error};

use deskline_db::StoreError;
use deskline_types::api::{
    ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, ResetPasswordRequest,
};
use deskline_types::models::UserProfile;

use crate::error::ApiError;
use crate::session::AuthError;
use crate::state::AppState;
use crate::validation::Validator;

const RESET_REQUESTED: &str = "If the email exists, a password reset link has been sent";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new()
        .email("email", &req.email)
        .password("password", &req.password)
        .name("name", &req.name)
        .finish()?;

    let registered = state
        .sessions
        .register(&req.email, &req.password, req.name.trim())
        .await
        .map_err(|e| match e {
            AuthError::Conflict(message) => ApiError::Conflict {
                message: message.into(),
                code: "EMAIL_EXISTS",
            },
            other => ApiError::internal("Registration failed", "REGISTRATION_ERROR")(other),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "data": registered,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new()
        .email("email", &req.email)
        .required("password", &req.password, "Password is required")
        .finish()?;

    let logged_in = state
        .sessions
        .login(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            AuthError::Unauthorized(message) => {
                ApiError::unauthorized(message, "INVALID_CREDENTIALS")
            }
            other => ApiError::internal("Login failed", "LOGIN_ERROR")(other),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "data": logged_in,
    })))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new()
        .required("refreshToken", &req.refresh_token, "Refresh token is required")
        .finish()?;

    let tokens = state
        .sessions
        .refresh(&req.refresh_token)
        .await
        .map_err(|e| match e {
            AuthError::Unauthorized(_) => {
                ApiError::unauthorized("Invalid refresh token", "INVALID_REFRESH_TOKEN")
            }
            other => ApiError::internal("Token refresh failed", "TOKEN_REFRESH_ERROR")(other),
        })?;

    Ok(Json(json!({
        "success": true,
        "data": { "tokens": tokens },
    })))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .sessions
        .logout(user.id)
        .await
        .map_err(ApiError::internal("Logout failed", "LOGOUT_ERROR"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Logout successful",
    })))
}

/// Always answers with the same message so the response does not reveal
/// whether the address is registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new().email("email", &req.email).finish()?;

    match state.sessions.forgot_password(&req.email).await {
        // Delivery of the token belongs to the mail collaborator.
        Ok(Some(_token)) => debug!("Reset token issued for {}", req.email),
        Ok(None) => {}
        Err(e) => error!("Forgot password error: {}", e),
    }

    Ok(Json(json!({
        "success": true,
        "message": RESET_REQUESTED,
    })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Validator::new()
        .required("token", &req.token, "Reset token is required")
        .password("password", &req.password)
        .finish()?;

    state
        .sessions
        .reset_password(&req.token, &req.password)
        .await
        .map_err(|e| match e {
            AuthError::Unauthorized(_) | AuthError::Store(StoreError::NotFound(_)) => {
                ApiError::BadRequest {
                    message: "Invalid or expired reset token".into(),
                    code: "INVALID_RESET_TOKEN",
                }
            }
            other => ApiError::internal("Password reset failed", "RESET_PASSWORD_ERROR")(other),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Password reset successfully",
    })))
}

pub async fn profile(Extension(user): Extension<UserProfile>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": { "user": user },
    }))
}
