use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::{
    repositories::{
        ContentStore, LeadStore, MemoryContentStore, MemoryLeadStore, PgContentStore, PgLeadStore,
    },
    routes,
    state::{AppState, DEFAULT_UPLOADS_DIR},
};
use common::{
    database::{DatabaseConfig, init_pool},
    session::{SessionConfig, SessionService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let session_config = SessionConfig::from_env()?;
    let sessions = SessionService::new(&session_config);

    let (content_store, lead_store) = open_stores().await?;
    let uploads_dir =
        std::env::var("UPLOADS_DIR").unwrap_or_else(|_| DEFAULT_UPLOADS_DIR.to_string());
    info!("Serving legacy uploads from {}", uploads_dir);
    let app_state =
        AppState::new(sessions, content_store, lead_store).with_uploads_dir(uploads_dir);

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("API service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Pick the storage backend from `STORE_BACKEND` (`postgres` unless `memory`)
async fn open_stores() -> Result<(Arc<dyn ContentStore>, Arc<dyn LeadStore>)> {
    let backend = std::env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string());

    if backend.eq_ignore_ascii_case("memory") {
        info!("Using in-memory stores; data is lost on restart");
        return Ok((
            Arc::new(MemoryContentStore::new()),
            Arc::new(MemoryLeadStore::new()),
        ));
    }

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let content_store = PgContentStore::new(pool.clone());
    content_store.init_schema().await?;
    let lead_store = PgLeadStore::new(pool);
    lead_store.init_schema().await?;

    Ok((Arc::new(content_store), Arc::new(lead_store)))
}
