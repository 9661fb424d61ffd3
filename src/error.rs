//! Custom error types and handling
//!
//! This module defines the application's error types and implements
//! conversion to HTTP responses for the Axum framework.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors
    #[error("Not found: {0}")]
    NotFound(String),

    // Session lifecycle preconditions (expected, user-facing, non-retryable)
    #[error("Exam window is not open: {reason} at {boundary}")]
    OutOfWindow {
        reason: &'static str,
        boundary: DateTime<Utc>,
    },

    #[error("Session has already been submitted")]
    AlreadySubmitted,

    #[error("No active session: {0}")]
    SessionNotActive(String),

    #[error("No in-progress session to submit")]
    NothingToSubmit,

    #[error("Session is not locked: {0}")]
    NotLocked(String),

    // Concurrency conflict that survived bounded retries; data integrity
    // cannot be guaranteed without operator attention
    #[error("Concurrent update conflict after {attempts} attempts")]
    ConcurrentUpdateConflict { attempts: u32 },

    // Upstream failures
    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in response
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::OutOfWindow { .. } => "OUT_OF_WINDOW",
            Self::AlreadySubmitted => "ALREADY_SUBMITTED",
            Self::SessionNotActive(_) => "SESSION_NOT_ACTIVE",
            Self::NothingToSubmit => "NOTHING_TO_SUBMIT",
            Self::NotLocked(_) => "NOT_LOCKED",
            Self::ConcurrentUpdateConflict { .. } => "CONCURRENT_UPDATE_CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidToken | Self::TokenExpired | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::Forbidden(_) | Self::OutOfWindow { .. } => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::NothingToSubmit => StatusCode::NOT_FOUND,
            Self::AlreadySubmitted | Self::SessionNotActive(_) | Self::NotLocked(_) => {
                StatusCode::CONFLICT
            }
            Self::ConcurrentUpdateConflict { .. }
            | Self::Database(_)
            | Self::Redis(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors but don't expose details to clients
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
            AppError::ConcurrentUpdateConflict { attempts } => {
                tracing::error!(attempts, "Optimistic-concurrency retries exhausted");
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.error_code().to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Implement From for common error types
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Redis(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors_are_4xx() {
        let errors = [
            AppError::OutOfWindow {
                reason: "exam opens",
                boundary: Utc::now(),
            },
            AppError::AlreadySubmitted,
            AppError::SessionNotActive("no session".to_string()),
            AppError::NothingToSubmit,
            AppError::NotLocked("in_progress".to_string()),
        ];
        for e in errors {
            assert!(e.status_code().is_client_error(), "{:?}", e);
        }
    }

    #[test]
    fn test_conflict_exhaustion_is_fatal() {
        let e = AppError::ConcurrentUpdateConflict { attempts: 3 };
        assert!(e.status_code().is_server_error());
        assert_eq!(e.error_code(), "CONCURRENT_UPDATE_CONFLICT");
    }
}
