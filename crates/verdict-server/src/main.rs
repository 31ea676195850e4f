//! Verdict DMN decision engine HTTP server
//!
//! Deploys DMN definitions and evaluates decision tables over REST.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verdict_engine::Engine;
use verdict_repository::{
    run_migrations, DefinitionRepository, MemoryRepository, PostgresRepository,
};
use verdict_server::api::{create_router, AppState};
use verdict_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load()?;
    init_tracing(&config)?;
    info!("loaded configuration: {config:?}");

    let state = init_state(&config).await?;
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("✓ server listening on http://{addr}");
    info!("  health check: http://{addr}/health");
    info!("  decision API: http://{addr}/api/v1/evaluate");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(config: &ServerConfig) -> Result<()> {
    let default_filter = format!(
        "verdict_server={level},verdict_engine={level},verdict_repository={level},tower_http=debug",
        level = config.log_level
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    Ok(())
}

/// Choose the storage backend and build the shared application state
async fn init_state(config: &ServerConfig) -> Result<AppState> {
    let repo: Arc<dyn DefinitionRepository> = match &config.database_url {
        Some(url) => {
            let repo = PostgresRepository::connect(url, config.db_max_connections).await?;
            run_migrations(repo.pool()).await?;
            info!("connected to database, migrations applied");
            Arc::new(repo)
        }
        None => {
            warn!("no database configured, definitions are stored in memory only");
            Arc::new(MemoryRepository::new())
        }
    };

    let engine = Arc::new(Engine::new(repo.clone()));

    Ok(AppState { repo, engine })
}

/// Resolve when the process receives Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutting down server...");
}
