//! # Comanda Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Startup Sequence                               │
//! │                                                                         │
//! │  config ──► tracing ──► SQLite (migrations) ──► AppState ──► Router    │
//! │                                                                │        │
//! │                          tunnel (background) ◄── bind host:port         │
//! │                                                                │        │
//! │              Ctrl-C / SIGTERM ──► graceful shutdown ──► close pool      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use comanda_db::{Database, DbConfig};
use comanda_server::config::ServerConfig;
use comanda_server::logging::init_tracing;
use comanda_server::tunnel::{create_strategy, TunnelStrategy};
use comanda_server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Comanda server...");
    info!(
        bind = %config.bind_address(),
        database = %config.database.path.display(),
        tunnel = %config.tunnel.strategy,
        "Configuration loaded"
    );

    // Database
    let db = Database::new(
        DbConfig::new(config.database.path.clone()).max_connections(config.database.max_connections),
    )
    .await
    .context("Failed to open database")?;
    info!("Database ready");

    let bind_address = config.bind_address();
    let tunnel = create_strategy(&config.tunnel).context("Failed to configure tunnel")?;

    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(addr = %bind_address, "HTTP server listening");

    spawn_tunnel(tunnel.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Err(e) = tunnel.disconnect().await {
        warn!(error = %e, "Failed to stop tunnel");
    }

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Connects the tunnel without holding up the HTTP server.
fn spawn_tunnel(tunnel: Arc<dyn TunnelStrategy>) {
    tokio::spawn(async move {
        match tunnel.connect().await {
            Ok(()) => match tunnel.tunnel_url().await {
                Some(url) => info!(strategy = tunnel.strategy_name(), %url, "Tunnel connected"),
                None => info!(
                    strategy = tunnel.strategy_name(),
                    "Tunnel connected, URL not reported yet"
                ),
            },
            Err(e) => error!(strategy = tunnel.strategy_name(), error = %e, "Tunnel failed to start"),
        }
    });
}

/// Graceful shutdown signal handler.
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
