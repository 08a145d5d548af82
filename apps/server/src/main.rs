//! # Barbearia Server
//!
//! Binary entry point: loads configuration, opens the database and serves
//! the JSON API until Ctrl+C or SIGTERM.
//!
//! ## Startup Sequence
//! ```text
//! init_tracing ──► AppConfig::load ──► Database::new (migrations)
//!                                            │
//!        axum::serve ◄── create_router ◄── AppState (notifier, policy)
//! ```

use std::sync::Arc;

use anyhow::Context;
use barbearia_db::{Database, DbConfig};
use barbearia_server::config::AppConfig;
use barbearia_server::notifier::{DisabledNotifier, LogNotifier, Notifier};
use barbearia_server::state::AppState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting barbearia server...");

    let config = AppConfig::load().context("failed to load configuration")?;
    info!(
        host = %config.host,
        port = config.port,
        database = %config.database_path.display(),
        oversell_policy = ?config.oversell_policy,
        whatsapp_enabled = config.whatsapp_enabled,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(config.database_path.clone()).max_connections(config.max_connections),
    )
    .await
    .context("failed to open database")?;
    info!("Database ready");

    let notifier: Arc<dyn Notifier> = if config.whatsapp_enabled {
        Arc::new(LogNotifier)
    } else {
        Arc::new(DisabledNotifier)
    };

    let state = AppState::new(db.clone(), notifier, config.oversell_policy);
    let app = barbearia_server::create_router(state, config.cors_permissive);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins; the default keeps sqlx quiet.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,barbearia=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
