use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use keepmark_api::config::{AppConfig, StorageBackend};
use keepmark_api::logging::{self, LoggingConfig};
use keepmark_api::services::HttpTitleResolver;
use keepmark_api::AppState;
use keepmark_db::{Database, MemoryStore, PoolConfig, Repositories};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = logging::init(&LoggingConfig::from_env());
    let config = AppConfig::from_env()?;

    let repos: Repositories = match config.storage {
        StorageBackend::Postgres => {
            let pool_config =
                PoolConfig::new().max_connections(config.database.max_connections);
            let db = Database::connect_with_config(&config.database.url, pool_config).await?;
            db.migrate().await?;
            info!(subsystem = "db", "Migrations applied");
            db.into()
        }
        StorageBackend::Memory => {
            warn!(
                subsystem = "db",
                "Using in-memory storage; data is lost on restart"
            );
            MemoryStore::new().into()
        }
    };

    let title_resolver = Arc::new(HttpTitleResolver::new()?);
    let state = AppState::new(repos, config.auth.clone(), title_resolver);
    let app = keepmark_api::app(state, &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(
        environment = ?config.server.environment,
        storage = ?config.storage,
        "Starting server on {}",
        addr
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
