use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use layoutsmith_api::config::{ServerConfig, StorageBackend};
use layoutsmith_api::generator;
use layoutsmith_api::router::build_app_router;
use layoutsmith_api::state::AppState;
use layoutsmith_db::{MemoryStore, PgStore, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "layoutsmith_api=debug,layoutsmith_db=info,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Storage ---
    let store: Arc<dyn Store> = match &config.storage {
        StorageBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = layoutsmith_db::create_pool(database_url, *max_connections)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            layoutsmith_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            tracing::info!("Database health check passed");

            layoutsmith_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    // --- Generator ---
    if !config.generator.is_configured() {
        tracing::warn!("GENERATOR_API_URL/GENERATOR_API_KEY not set; generation will use placeholders");
    }
    let generator = generator::from_config(&config.generator)
        .context("Failed to build generator client")?;

    // --- App state ---
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        generator: Arc::from(generator),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
