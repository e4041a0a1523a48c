//! Session gate for admin routes

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use common::session::{SESSION_COOKIE, SessionClaims};
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Authenticated admin, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub subject: String,
}

impl From<SessionClaims> for AdminSession {
    fn from(claims: SessionClaims) -> Self {
        Self {
            subject: claims.sub,
        }
    }
}

/// Reject the request before it reaches the handler unless it carries a
/// valid session token, in the cookie or as a Bearer header
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    let claims = state
        .sessions
        .verify_presented(jar.get(SESSION_COOKIE).map(|c| c.value()), authorization)
        .map_err(|e| {
            warn!("Rejected {} {}: {}", req.method(), req.uri().path(), e);
            ApiError::Unauthorized(e)
        })?;

    req.extensions_mut().insert(AdminSession::from(claims));

    Ok(next.run(req).await)
}
