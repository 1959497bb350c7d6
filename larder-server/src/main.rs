//! larder-server binary.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use larder_server::{build_router, AppState, ServerConfig};
use larder_store::{MemoryRecipeStore, PgRecipeStore, RecipeStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    let store: Arc<dyn RecipeStore> = match &config.database_url {
        Some(url) => {
            let store = PgRecipeStore::connect(url, config.max_connections)
                .await
                .context("Failed to connect to database")?;
            store
                .init_schema()
                .await
                .context("Failed to create recipe schema")?;
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set. Running without persistence.");
            Arc::new(MemoryRecipeStore::new())
        }
    };

    let prefix = config.normalized_prefix();
    let app = build_router(Arc::new(AppState::new(store)), &prefix);

    let addr = config.bind_addr();
    info!("Starting Larder server on {} (API prefix '{}')", addr, prefix);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
