//! Session tokens for the admin area
//!
//! A session is an HS256 JWT carried by the caller in an HTTP-only cookie.
//! Nothing is persisted server-side: a token is valid while its signature
//! checks out and its expiry has not passed. Logging out only clears the
//! caller's cookie, so a captured token stays usable until it expires.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Name of the cookie that carries the session token
pub const SESSION_COOKIE: &str = "token";

/// Fixed session lifetime (2 hours)
pub const SESSION_TTL_SECONDS: i64 = 2 * 60 * 60;

/// The only role the site knows about
pub const ADMIN_ROLE: &str = "admin";

/// Authentication failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Username or password absent from the login request
    #[error("Missing credentials")]
    MissingCredentials,

    /// Credentials do not match the configured pair
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No token presented
    #[error("Unauthorized")]
    Unauthenticated,

    /// Malformed token or bad signature
    #[error("Invalid token")]
    InvalidToken,

    /// Token past its expiry
    #[error("Session expired")]
    Expired,
}

/// Session signing configuration
#[derive(Clone)]
pub struct SessionConfig {
    secret: String,
}

impl SessionConfig {
    /// Create a configuration from a signing secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Create a new SessionConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HMAC secret used to sign session tokens (required)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(Self::new(secret))
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Admin username
    pub sub: String,
    /// Always `admin`
    pub role: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds)
    pub exp: i64,
}

impl SessionClaims {
    /// Issuance time as a timestamp
    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_default()
    }

    /// Expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }
}

/// A freshly issued token together with its claims
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub value: String,
    pub claims: SessionClaims,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionService {
    /// Initialize a new session service
    pub fn new(config: &SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked against the caller's clock in `verify_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Issue a token for `subject` valid for two hours from now
    pub fn issue(&self, subject: &str) -> Result<SessionToken> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token for `subject` valid for two hours from `now`
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<SessionToken> {
        let iat = now.timestamp();
        let claims = SessionClaims {
            sub: subject.to_string(),
            role: ADMIN_ROLE.to_string(),
            iat,
            exp: iat + SESSION_TTL_SECONDS,
        };

        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(SessionToken { value, claims })
    }

    /// Verify a presented token against the current time
    pub fn verify(&self, token: Option<&str>) -> Result<SessionClaims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a presented token against `now`
    ///
    /// A token is still accepted at the exact second of its expiry and
    /// rejected from the following second on.
    pub fn verify_at(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Rejected session token: {}", e);
                AuthError::InvalidToken
            })?
            .claims;

        if claims.role != ADMIN_ROLE {
            return Err(AuthError::InvalidToken);
        }

        if now.timestamp() > claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }

    /// Verify the token a request presents, as a cookie value and/or an
    /// `Authorization` header
    ///
    /// The cookie is tried first. When it fails and a Bearer token is also
    /// present, the Bearer token decides; otherwise the cookie's error stands.
    pub fn verify_presented(
        &self,
        cookie: Option<&str>,
        authorization: Option<&str>,
    ) -> Result<SessionClaims, AuthError> {
        self.verify_presented_at(cookie, authorization, Utc::now())
    }

    /// [`verify_presented`](Self::verify_presented) against `now`
    pub fn verify_presented_at(
        &self,
        cookie: Option<&str>,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, AuthError> {
        let bearer = authorization.and_then(bearer_token);

        match (cookie, bearer) {
            (Some(cookie), Some(bearer)) => self
                .verify_at(Some(cookie), now)
                .or_else(|err| self.verify_at(Some(bearer), now).map_err(|_| err)),
            (cookie, bearer) => self.verify_at(cookie.or(bearer), now),
        }
    }
}

/// The token carried by an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}
