//! Main entry point for the complaint portal API server

use anyhow::{Context, Result};
use portal_api::{AppState, build_router};
use portal_core::{Config, init_logging};
use portal_database::Database;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Names an explicit configuration file instead of `./config.*`
const CONFIG_FILE_VAR: &str = "PORTAL_CONFIG_FILE";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for development convenience)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: .env file not loaded: {e}");
    }

    let loaded = match std::env::var_os(CONFIG_FILE_VAR) {
        Some(path) => Config::load_file(Path::new(&path)),
        None => Config::load(),
    };
    let config = loaded.as_ref().cloned().unwrap_or_default();

    init_logging(&config.logging).context("Failed to initialize logging")?;

    if let Err(e) = &loaded {
        warn!("Failed to load config ({}), using defaults", e);
    }

    info!(
        "Complaint Portal API Server v{} starting on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.host,
        config.server.port
    );

    info!("Connecting to database...");
    let database = Database::new(&config).await.map_err(|e| {
        error!("Failed to connect to database: {}", e);
        anyhow::anyhow!("Database connection failed: {e}")
    })?;
    info!("Database connection established");

    info!("Running database migrations...");
    database
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {e}"))?;
    info!("Database migrations completed");

    database
        .health_check()
        .await
        .map_err(|e| anyhow::anyhow!("Database health check failed: {e}"))?;
    info!("Database health check passed");

    let state = AppState::new(config.clone(), Arc::new(database.store()));
    state.validate().await.with_context(|| {
        format!(
            "Upload directory is not writable: {}",
            state.upload_dir.display()
        )
    })?;
    info!(upload_dir = %state.upload_dir.display(), "Attachment storage ready");

    if !state.admin_key_required() {
        warn!("No admin key configured; review routes are open");
    }

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Server ready");
    info!("  Submit:  http://{}/api/complaints", addr);
    info!("  Track:   http://{}/api/complaints/track/<code>", addr);
    info!("  Health:  http://{}/health", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received terminate signal, shutting down gracefully...");
        },
    }
}
