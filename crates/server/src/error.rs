// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use reindexd_db::DbError;

use crate::jobs::JobError;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::Job(job_err) => match job_err {
                JobError::InvalidArgument(msg) => {
                    tracing::warn!(message = %msg, "Invalid reindex request");
                    (
                        StatusCode::BAD_REQUEST,
                        ErrorResponse::with_details("Invalid request", msg.clone()),
                    )
                }
                JobError::Conflict(msg) => {
                    tracing::warn!(message = %msg, "Reindex conflict");
                    (
                        StatusCode::CONFLICT,
                        ErrorResponse::with_details("Conflict", msg.clone()),
                    )
                }
                JobError::Overloaded(msg) => {
                    tracing::warn!(message = %msg, "Reindex admission rejected");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        ErrorResponse::with_details("Service unavailable", msg.clone()),
                    )
                }
                JobError::NotFound(id) => {
                    tracing::warn!(job_id = %id, "Reindexing job not found");
                    (
                        StatusCode::NOT_FOUND,
                        ErrorResponse::with_details(
                            "Reindexing job not found",
                            format!("Job ID: {id}"),
                        ),
                    )
                }
                JobError::NoJobs => {
                    tracing::warn!("Latest reindexing job requested before any run");
                    (
                        StatusCode::NOT_FOUND,
                        ErrorResponse::new("No reindexing job has run yet"),
                    )
                }
                JobError::Store(db_err) => {
                    tracing::error!(error = %db_err, "Database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::with_details("Database error", db_err.to_string()),
                    )
                }
                JobError::CorruptSnapshot(e) => {
                    tracing::error!(error = %e, "Corrupt job snapshot");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Corrupt job snapshot"),
                    )
                }
            },
            ApiError::Database(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("Database error", db_err.to_string()),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
