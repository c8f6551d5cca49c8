//! Redis-backed cache.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

const KEY_PREFIX: &str = "url:";

/// Cache entries stored as plain Redis strings under `url:<token>`.
///
/// Redis expires each key on its own (`PSETEX`), so an entry disappears
/// exactly when its record's TTL ends. Every command is bounded by the I/O
/// timeout.
pub struct RedisCache {
    conn: ConnectionManager,
    io_timeout: Duration,
}

impl RedisCache {
    /// Opens a managed connection and checks it with a `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] for a bad URL, a refused
    /// connection or a failed `PING`.
    pub async fn connect(redis_url: &str, io_timeout: Duration) -> CacheResult<Self> {
        let connection_error = |stage: &str, e: redis::RedisError| {
            CacheError::ConnectionError(format!("{stage}: {e}"))
        };

        let client =
            redis::Client::open(redis_url).map_err(|e| connection_error("Invalid Redis URL", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| connection_error("Redis unreachable", e))?;

        let cache = Self { conn, io_timeout };
        cache
            .conn
            .clone()
            .ping::<()>()
            .await
            .map_err(|e| connection_error("Redis PING failed", e))?;

        info!("Connected to Redis");
        Ok(cache)
    }

    fn key(token: &str) -> String {
        format!("{KEY_PREFIX}{token}")
    }

    /// Runs one command under the I/O deadline.
    async fn bounded<T>(
        &self,
        command: &str,
        token: &str,
        fut: impl Future<Output = RedisResult<T>>,
    ) -> CacheResult<T> {
        match tokio::time::timeout(self.io_timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                CacheError::OperationError(format!("Redis {command} failed for {token}: {e}"))
            }),
            Err(_) => Err(CacheError::OperationError(format!(
                "Redis {command} timed out for {token}"
            ))),
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, token: &str) -> CacheResult<String> {
        let mut conn = self.conn.clone();
        let found = self
            .bounded("GET", token, conn.get::<_, Option<String>>(Self::key(token)))
            .await;

        match found {
            Ok(Some(url)) => Ok(url),
            Ok(None) => {
                debug!(token, "Cache miss");
                Err(CacheError::Miss(token.to_string()))
            }
            Err(e) => {
                warn!(token, error = %e, "Cache read failed");
                Err(CacheError::Miss(token.to_string()))
            }
        }
    }

    async fn set_url(&self, token: &str, url: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        // PSETEX rejects a zero expiry.
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        self.bounded(
            "PSETEX",
            token,
            conn.pset_ex::<_, _, ()>(Self::key(token), url, ttl_ms),
        )
        .await?;
        debug!(token, ttl_ms, "Cached");
        Ok(())
    }

    async fn invalidate(&self, token: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let removed: i64 = self
            .bounded("DEL", token, conn.del(Self::key(token)))
            .await?;
        if removed > 0 {
            debug!(token, "Cache entry invalidated");
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        self.bounded("PING", "-", conn.ping::<()>()).await.is_ok()
    }
}
