//! playerscope-server - HTTP service for player analytics
//!
//! Serves the game preference, spending habits and value score analyses
//! over the configured SQLite database.

mod api;

use anyhow::{Context, Result};
use clap::Parser;
use playerscope_core::{Config, Database};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "playerscope-server")]
#[command(about = "Serve player analytics over HTTP")]
#[command(version)]
struct Args {
    /// Config file (defaults to the XDG config path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match args.config {
        Some(ref path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Initialize logging
    let _log_guard =
        playerscope_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Open database
    let db_path = config.resolved_database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let state = api::AppState::new(Arc::new(db), &config.analytics);
    let app = api::router(state, &config.server.api_prefix);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(addr = %addr, prefix = %config.server.api_prefix, "playerscope server listening");
    println!("playerscope listening on http://{}", addr);
    println!(
        "logs: {}",
        playerscope_core::logging::log_file_path().display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("playerscope server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
