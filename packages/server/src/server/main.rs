// Main entry point for the telemetry ingest server

use anyhow::{Context, Result};
use ingest_core::kernel::EventStore;
use ingest_core::server::{build_app, AppState};
use ingest_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ingest_core=debug,sqlx=warn,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting telemetry ingest service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(db_path = %config.db_path, "Configuration loaded");

    // Open the store; a schema that cannot be applied stops the service here
    let store = EventStore::open(&config.db_path)
        .await
        .context("Failed to open event store")?;

    let state = AppState::new(store.clone());
    let shutdown = state.shutdown.clone();
    let app = build_app(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!(
        addr = %config.listen_addr,
        db = %config.db_path,
        "ingest listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        })
        .await
        .context("Server error")?;

    store.close().await;
    Ok(())
}
