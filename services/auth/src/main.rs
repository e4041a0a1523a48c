use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod credentials;
mod error;
mod routes;

use common::session::{SessionConfig, SessionService};

use crate::credentials::AdminCredentials;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub credentials: AdminCredentials,
    pub cookie_secure: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

    let session_config = SessionConfig::from_env()?;
    let sessions = SessionService::new(&session_config);
    let credentials = AdminCredentials::from_env()?;
    let cookie_secure = std::env::var("COOKIE_SECURE")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    info!(
        "Admin login configured for {} (secure cookies: {})",
        credentials.username(),
        cookie_secure
    );

    let app_state = AppState {
        sessions,
        credentials,
        cookie_secure,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Authentication service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
