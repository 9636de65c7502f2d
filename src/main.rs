//! fin_pager - Cached, token-bounded financial data tool server
//!
//! Serves tool calls over HTTP, answering from a fixture directory.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fin_pager::tools::FixtureProvider;
use fin_pager::{create_router, AppState, Config};

/// Main entry point for the tool server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the fixture provider, shared cache and paginator
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fin_pager=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting fin_pager tool server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_capacity={}, max_tokens={}, max_column_width={}, page_sizing={}, dedupe_fetches={}, port={}",
        config.cache_capacity,
        config.max_tokens,
        config.max_column_width,
        config.page_sizing,
        config.dedupe_fetches,
        config.server_port
    );

    if !config.fixture_dir.is_dir() {
        warn!(
            "Fixture directory {} does not exist; every call will report missing data",
            config.fixture_dir.display()
        );
    }
    info!("Exports are written under {}", config.export_dir.display());
    let mut provider = FixtureProvider::new(&config.fixture_dir);
    if config.fetch_timeout_ms > 0 {
        provider = provider.with_timeout(Duration::from_millis(config.fetch_timeout_ms));
    }
    let provider = Arc::new(provider);
    let state = AppState::from_config(&config, provider);
    info!("Tool service initialized");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
