//! Phonebook GraphQL Server Library
//!
//! Serves the phonebook schema over HTTP with bearer-token authentication.

pub mod config;
pub mod ctx;
pub mod error;
pub mod graphql;
pub mod middleware;
pub mod router;

use phonebook_core::SystemClock;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{AppState, ServerConfig};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        // Already set, ignore
    }

    info!("=== Phonebook Server ===");

    let config = ServerConfig::from_env()?;
    match &config.database_url {
        Some(url) => info!("Database: {}", url),
        None => info!("Database: in-memory"),
    }

    let store = config.open_store().await?;
    let state = AppState::new(&config, store, Arc::new(SystemClock));
    let app = router::router(state);

    let addr = config.socket_addr();
    info!("Server ready at http://{}/graphql", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
