//! Tenantry server.
//!
//! Serves the product API for a fixed set of tenants, each backed by its own
//! database.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tenantry_rest::{AppState, ServerConfig, create_app, init_logging};
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Starts the Axum HTTP server and drains it on shutdown.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    let signalled = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let signalled = Arc::clone(&signalled);
            async move {
                shutdown_signal().await;
                signalled.notify_one();
            }
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = signalled.notified() => {
            let drain = Duration::from_secs(config.shutdown_timeout);
            match tokio::time::timeout(drain, &mut server).await {
                Ok(result) => result?,
                Err(_) => warn!(
                    timeout_secs = config.shutdown_timeout,
                    "In-flight requests did not finish before the shutdown timeout"
                ),
            }
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        tenants = ?config.tenant_names(),
        tenants_location = %config.tenants_location.display(),
        "Starting Tenantry server"
    );

    let state = AppState::initialize(config.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize tenant databases: {}", e))?;
    let router = state.router().clone();

    let result = serve(create_app(state), &config).await;

    router.close();
    info!("Server shutdown complete");
    result
}
