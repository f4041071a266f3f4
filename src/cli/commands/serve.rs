use anyhow::Context;
use clap::Args;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::app::app;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, DocumentStore, MemoryStore, PgStore};
use crate::state::AppState;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Bind address (overrides API_HOST)")]
    pub host: Option<String>,

    #[arg(long, help = "Listen port (overrides DOCSHELF_API_PORT / PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Keep everything in process memory instead of Postgres")]
    pub in_memory: bool,

    #[arg(long, help = "Apply pending migrations before listening")]
    pub migrate: bool,
}

pub async fn handle(args: ServeArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }

    let store: Arc<dyn DocumentStore> = if args.in_memory {
        if args.migrate {
            warn!("--migrate has no effect with --in-memory");
        }
        warn!("Using the in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to the database")?;
        if args.migrate {
            DatabaseManager::run_migrations(&pool).await?;
        }
        Arc::new(PgStore::new(pool))
    };

    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!(
        restore_status_mapping = ?config.api.restore_status_mapping,
        "Docshelf API listening on http://{}",
        bind_addr
    );

    axum::serve(listener, app(AppState::new(store, config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received, draining connections");
}
