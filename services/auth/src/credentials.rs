//! The single admin credential pair

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use common::session::AuthError;
use std::fmt;
use tracing::warn;

const DEFAULT_ADMIN_USER: &str = "admin";

/// Configured admin username and argon2 password hash
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password_hash: String,
}

impl AdminCredentials {
    /// Build credentials from a plaintext password, hashing it with argon2
    pub fn new(username: impl Into<String>, password: &str) -> Result<Self> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        Ok(Self {
            username: username.into(),
            password_hash,
        })
    }

    /// Build credentials from an existing argon2 PHC hash string
    pub fn with_hash(username: impl Into<String>, password_hash: impl Into<String>) -> Result<Self> {
        let password_hash = password_hash.into();
        PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        Ok(Self {
            username: username.into(),
            password_hash,
        })
    }

    /// Create credentials from environment variables
    ///
    /// # Environment Variables
    /// - `ADMIN_USER`: Admin username (default: "admin")
    /// - `ADMIN_PASSWORD_HASH`: Argon2 PHC hash of the admin password
    /// - `ADMIN_PASS`: Plaintext admin password, hashed at startup; only read
    ///   when `ADMIN_PASSWORD_HASH` is unset
    pub fn from_env() -> Result<Self> {
        let username =
            std::env::var("ADMIN_USER").unwrap_or_else(|_| DEFAULT_ADMIN_USER.to_string());

        if let Ok(hash) = std::env::var("ADMIN_PASSWORD_HASH") {
            return Self::with_hash(username, hash);
        }

        let password = std::env::var("ADMIN_PASS").map_err(|_| {
            anyhow::anyhow!("Either ADMIN_PASSWORD_HASH or ADMIN_PASS must be set")
        })?;
        warn!("ADMIN_PASS is set in plaintext; prefer ADMIN_PASSWORD_HASH outside development");

        Self::new(username, &password)
    }

    /// The configured admin username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Check a login attempt and return the session subject on success
    ///
    /// The password hash is always verified, even for an unknown username,
    /// and both mismatches report `InvalidCredentials`.
    pub fn check(&self, username: Option<&str>, password: Option<&str>) -> Result<String, AuthError> {
        let username = username
            .filter(|u| !u.trim().is_empty())
            .ok_or(AuthError::MissingCredentials)?;
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::MissingCredentials)?;

        let password_ok = self.verify_password(password);
        let username_ok = username == self.username;

        if password_ok && username_ok {
            Ok(self.username.clone())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    fn verify_password(&self, candidate: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}
