use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("You must be logged in")]
    Unauthenticated,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Upstream request failed: {0}")]
    Upstream(ApiError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Upstream auth rejections are the caller's credentials failing, so they
/// keep their status; everything else is a gateway failure.
impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::Status { status: 401, .. } => {
                tracing::warn!(error = %err, "upstream rejected caller token");
                AppError::Unauthenticated
            }
            ApiError::Status { status: 403, .. } => {
                tracing::warn!(error = %err, "upstream denied caller");
                AppError::Forbidden("Access denied by the blog service".to_string())
            }
            ApiError::Status { status: 404, .. } => AppError::NotFound(err.to_string()),
            _ => AppError::Upstream(err),
        }
    }
}

/// Errors shared out of a coalesced cache load.
impl From<Arc<ApiError>> for AppError {
    fn from(err: Arc<ApiError>) -> Self {
        AppError::from(err.as_ref().clone())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AppError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", self.to_string())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Upstream(e) => {
                tracing::error!(error = %e, "upstream request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Request to the blog service failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
