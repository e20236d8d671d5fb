/// Error types for Post Service
///
/// Every failure a request can hit maps onto one variant here. Errors are
/// rendered as `{ "error": "<message>" }` with a status code derived from the
/// variant.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Identity missing or credentials rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Empty post body, missing query parameter, oversized body
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Referenced resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate resource (author names)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Storage details stay in the logs.
        let message = match self {
            AppError::DatabaseError(detail) => {
                tracing::error!(error = %detail, "database error while serving request");
                "Database error".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error while serving request");
                "Internal error".to_string()
            }
            AppError::Unauthorized(msg)
            | AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
        };

        HttpResponse::build(status).json(serde_json::json!({ "error": message }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
