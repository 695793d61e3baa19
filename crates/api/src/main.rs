use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use domain::services::GeoIndex;
use matchday_api::app::create_app;
use matchday_api::config::Config;
use matchday_api::jobs::{GeoSyncJob, JobScheduler, MatchStatusJob, PoolMetricsJob};
use matchday_api::middleware::{init_logging, init_metrics};
use persistence::geo_index::InMemoryGeoIndex;
use persistence::repositories::{MatchRepository, SchedulerLeaseRepository};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging and metrics
    init_logging(&config.logging);
    init_metrics();

    info!("Starting Matchday API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let db_config = persistence::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    };
    let pool = persistence::db::create_pool(&db_config).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // Warm the geo index from the authoritative searchable set
    let geo_index: Arc<InMemoryGeoIndex> = Arc::new(InMemoryGeoIndex::new());
    let match_repository = MatchRepository::new(pool.clone());
    let entries = match_repository.searchable_entries().await?;
    geo_index
        .bulk_add(&entries)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    info!(entries = entries.len(), "Geo index warmed");

    // Start background jobs
    let leases = Arc::new(SchedulerLeaseRepository::new(pool.clone()));
    let mut scheduler = JobScheduler::new(leases);
    scheduler.register(MatchStatusJob::new(
        match_repository.clone(),
        geo_index.clone(),
        &config.scheduler,
    ));
    scheduler.register(GeoSyncJob::new(
        match_repository,
        geo_index.clone(),
        &config.scheduler,
    ));
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    // Build application
    let app = create_app(config.clone(), pool, geo_index);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain background jobs before exit
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

/// Resolves on ctrl-c or, on Unix, SIGTERM (the orchestrator stop signal).
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
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
