//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{error::DatabaseError, session::AuthError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::validation::ValidationError;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, invalid or expired session
    #[error("{0}")]
    Unauthorized(#[from] AuthError),

    /// Form input failed validation
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Record or image does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uploaded image exceeds the size limit
    #[error("File too large. Max size is 5MB.")]
    PayloadTooLarge,

    /// Newsletter email already present
    #[error("Email already subscribed")]
    Duplicate,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            ApiError::PayloadTooLarge => (
                StatusCode::BAD_REQUEST,
                ApiError::PayloadTooLarge.to_string(),
            ),
            ApiError::Duplicate => (StatusCode::BAD_REQUEST, ApiError::Duplicate.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Database(err) => {
                error!("Store failure: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
