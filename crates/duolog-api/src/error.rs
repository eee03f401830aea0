//! API error types with proper HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg.clone(),
            ),
            ApiError::Internal(msg) => {
                // Don't expose internal errors to clients
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<duolog_persist::StorageError> for ApiError {
    fn from(e: duolog_persist::StorageError) -> Self {
        match e {
            duolog_persist::StorageError::NotFound(msg) => ApiError::NotFound(msg),
            duolog_persist::StorageError::AlreadyExists(msg) => ApiError::Conflict(msg),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<duolog_stream::BrokerError> for ApiError {
    fn from(e: duolog_stream::BrokerError) -> Self {
        match e {
            duolog_stream::BrokerError::SessionNotFound(id) => {
                ApiError::NotFound(format!("debate {}", id))
            }
            duolog_stream::BrokerError::SessionClosed(id) => {
                ApiError::Conflict(format!("debate {} already closed", id))
            }
            duolog_stream::BrokerError::SessionExists(id) => {
                ApiError::Conflict(format!("debate {} already exists", id))
            }
        }
    }
}

impl From<duolog_eval::EvalError> for ApiError {
    fn from(e: duolog_eval::EvalError) -> Self {
        match e {
            duolog_eval::EvalError::UnknownBenchmark(inner) => {
                ApiError::Validation(inner.to_string())
            }
            duolog_eval::EvalError::UnknownStrategy(inner) => {
                ApiError::Validation(inner.to_string())
            }
            duolog_eval::EvalError::Storage(inner) => inner.into(),
            other => ApiError::Validation(other.to_string()),
        }
    }
}

impl From<duolog_core::UnknownStrategyError> for ApiError {
    fn from(e: duolog_core::UnknownStrategyError) -> Self {
        ApiError::Validation(e.to_string())
    }
}
