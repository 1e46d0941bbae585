use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request-scoped failure taxonomy. Every variant terminates the single
/// request it occurred in; none is fatal to the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, garbled, badly signed or expired token. The precise cause is
    /// never surfaced to the client.
    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Token verified but its subject no longer exists — a 404-class
    /// condition, distinct from authentication failures.
    #[error("User not found")]
    IdentityNotFound,

    #[error("Access forbidden: insufficient privileges")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::IdentityNotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let msg = match &self {
            AppError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}
