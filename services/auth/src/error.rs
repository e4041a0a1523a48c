//! Error responses for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::session::AuthError;
use serde_json::json;
use thiserror::Error;

/// Custom error type for authentication endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    /// Login or token check failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Auth(AuthError::MissingCredentials) => {
                (StatusCode::BAD_REQUEST, AuthError::MissingCredentials.to_string())
            }
            ApiError::Auth(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
