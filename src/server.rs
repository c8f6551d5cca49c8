//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, background tasks, and the Axum
//! server lifecycle.

use crate::config::{Config, mask_connection_string};
use crate::domain::expiration_sweeper::ExpirationSweeper;
use crate::domain::redirect_counter::RedirectCounter;
use crate::domain::repositories::Registry;
use crate::infrastructure::cache::{CacheService, MemoryCache, RedisCache};
use crate::infrastructure::persistence::PgRegistry;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// How long shutdown waits for queued redirect counts.
const COUNTER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the PostgreSQL pool, retrying with backoff while the database comes up.
///
/// # Errors
///
/// Returns an error once every attempt has failed.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let options = config.pool.options();

    let backoff = ExponentialBackoff::from_millis(2)
        .factor(100)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(4);

    let options = &options;
    let database_url = config.database_url.as_str();

    Retry::spawn(backoff, move || async move {
        options
            .clone()
            .connect(database_url)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    database = %mask_connection_string(database_url),
                    error = %e,
                    "Database connection attempt failed"
                );
            })
    })
    .await
    .context("Failed to connect to database")
}

/// Connects the cache, falling back to the in-process cache when Redis is
/// not configured or unreachable.
pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::warn!("Redis not configured, using in-memory cache");
        return Arc::new(MemoryCache::new());
    };

    match RedisCache::connect(redis_url, config.io_timeout).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using in-memory cache.", e);
            Arc::new(MemoryCache::new())
        }
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or in-memory fallback)
/// - Redirect counter worker
/// - Expiration sweeper
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let cache = connect_cache(&config).await;
    let registry: Arc<dyn Registry> =
        Arc::new(PgRegistry::new(Arc::new(pool), config.io_timeout));

    let (counter, counter_worker) = RedirectCounter::spawn(
        registry.clone(),
        config.counter.clone(),
    );
    tracing::info!("Redirect counter started");

    let sweeper = ExpirationSweeper::new(
        registry.clone(),
        cache.clone(),
        config.sweep.interval,
        config.sweep.batch_size,
    )
    .spawn();

    let state = AppState::new(
        registry,
        cache,
        counter.clone(),
        config.links.clone(),
        config.delete_all_policy,
    );

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();

    if tokio::time::timeout(COUNTER_DRAIN_TIMEOUT, counter.wait_idle())
        .await
        .is_err()
    {
        tracing::warn!("Redirect counts still pending at shutdown");
    }
    drop(counter);
    counter_worker.abort();

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
