use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use deskline_db::StoreError;

use crate::validation::FieldError;

/// Error returned by every handler. Rendered as `{ "error", "code" }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{message}")]
    BadRequest { message: String, code: &'static str },

    #[error("{message}")]
    Unauthorized { message: String, code: &'static str },

    #[error("{message}")]
    NotFound { message: String, code: String },

    #[error("{message}")]
    Conflict { message: String, code: &'static str },

    #[error("{message}: {cause}")]
    Internal {
        message: &'static str,
        code: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>, code: &'static str) -> Self {
        Self::Unauthorized {
            message: message.into(),
            code,
        }
    }

    /// `map_err` adapter for failures the caller cannot act on.
    pub fn internal<E>(message: &'static str, code: &'static str) -> impl FnOnce(E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        move |err| Self::Internal {
            message,
            code,
            cause: err.into(),
        }
    }

    /// `map_err` adapter for store calls: a missing row becomes a 404 named
    /// after the entity, anything else a 500 with the given message.
    pub fn store(message: &'static str, code: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |err| match err {
            StoreError::NotFound(entity) => not_found(entity),
            other => Self::Internal {
                message,
                code,
                cause: other.into(),
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// "knowledge item" -> ("Knowledge item not found", "KNOWLEDGE_ITEM_NOT_FOUND")
pub fn not_found(entity: &str) -> ApiError {
    let mut chars = entity.chars();
    let capitalized = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
        .unwrap_or_default();

    ApiError::NotFound {
        message: format!("{capitalized} not found"),
        code: format!("{}_NOT_FOUND", entity.to_uppercase().replace(' ', "_")),
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [FieldError]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        let body = match &self {
            Self::Validation(details) => {
                warn!("Validation failed: {:?}", details);
                ErrorBody {
                    error: "Validation failed",
                    code: "VALIDATION_ERROR",
                    details: Some(details.as_slice()),
                }
            }
            Self::BadRequest { code, .. }
            | Self::Unauthorized { code, .. }
            | Self::Conflict { code, .. } => ErrorBody {
                error: &message,
                code,
                details: None,
            },
            Self::NotFound { message, code } => ErrorBody {
                error: message,
                code,
                details: None,
            },
            Self::Internal {
                message,
                code,
                cause,
            } => {
                error!("{}: {:#}", message, cause);
                ErrorBody {
                    error: message,
                    code,
                    details: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
