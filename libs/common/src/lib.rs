//! Common library for the showcase site
//!
//! This crate provides functionality shared by the site's services: database
//! connectivity, error types, and the signed session tokens that gate the
//! admin area.

pub mod database;
pub mod error;
pub mod limits;
pub mod session;

/// Example usage of the session module
///
/// ```rust
/// use common::session::{SessionConfig, SessionService};
///
/// let sessions = SessionService::new(&SessionConfig::new("a-long-random-secret"));
/// let issued = sessions.issue("admin").unwrap();
/// let claims = sessions.verify(Some(&issued.value)).unwrap();
/// assert_eq!(claims.sub, "admin");
/// ```
pub fn example_usage() {}
