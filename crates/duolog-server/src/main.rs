//! Duolog server - standalone entry point for the HTTP API
//!
//! A thin wrapper around `duolog-api` so deployments get a runnable
//! binary without touching the library crates.

use anyhow::Result;
use duolog_api::{init_tracing, Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    tracing::info!("Starting duolog server...");

    // PaaS compatibility: map a provided $PORT to DUOLOG_PORT
    if let Ok(port) = std::env::var("PORT") {
        if std::env::var("DUOLOG_PORT").is_err() {
            tracing::info!("Mapping PORT {} to DUOLOG_PORT", port);
            std::env::set_var("DUOLOG_PORT", port);
        }
    }

    let config = ServerConfig::from_env();

    let server = Server::new(config).await.map_err(|e| {
        tracing::error!("Failed to initialize server: {}", e);
        anyhow::anyhow!(e)
    })?;

    server.run().await.map_err(|e| {
        tracing::error!("Server error during execution: {}", e);
        anyhow::anyhow!(e)
    })?;

    Ok(())
}
