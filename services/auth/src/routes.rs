//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::session::{SESSION_COOKIE, SESSION_TTL_SECONDS};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{AppState, error::ApiError};

/// Request for admin login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify))
        .route("/api/auth/logout", post(logout))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Admin login endpoint
///
/// On success the session token is returned only as an HTTP-only cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let subject = state
        .credentials
        .check(payload.username.as_deref(), payload.password.as_deref())
        .inspect_err(|e| warn!("Login rejected: {}", e))?;

    let token = state.sessions.issue(&subject).map_err(|e| {
        error!("Failed to issue session token: {}", e);
        ApiError::InternalServerError
    })?;

    info!("Admin session issued for {}", subject);

    let cookie = Cookie::build((SESSION_COOKIE, token.value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure)
        .path("/")
        .max_age(time::Duration::seconds(SESSION_TTL_SECONDS));

    Ok((
        StatusCode::OK,
        jar.add(cookie),
        Json(json!({"message": "Logged in"})),
    ))
}

/// Session check endpoint used by the admin pages
pub async fn verify(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok());
    let claims = state
        .sessions
        .verify_presented(jar.get(SESSION_COOKIE).map(|c| c.value()), authorization)?;

    Ok(Json(json!({
        "ok": true,
        "user": claims,
    })))
}

/// Logout endpoint
///
/// Only clears the caller's cookie. The token itself stays valid until it
/// expires because sessions are not tracked server-side.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    info!("Logout request");

    // Emit the removal cookie even when the request carried none.
    let mut removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    removal.make_removal();

    (
        StatusCode::OK,
        jar.add(removal),
        Json(json!({"message": "Logged out"})),
    )
}
