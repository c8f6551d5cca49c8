//! Cache service trait and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The key was never set or its TTL has lapsed. Callers cannot tell which.
    #[error("Cache miss for {0}")]
    Miss(String),
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Ephemeral token → URL lookup with per-entry expiry.
///
/// The redirect path reads only from this cache. A miss is final: callers must
/// not fall back to the registry.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process cache
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the URL stored under `token`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Miss`] if the key is absent or expired, and when a
    /// read times out or fails at the backend.
    async fn get_url(&self, token: &str) -> CacheResult<String>;

    /// Stores `url` under `token`, expiring `ttl` after the call.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::OperationError`] if the write fails.
    async fn set_url(&self, token: &str, url: &str, ttl: Duration) -> CacheResult<()>;

    /// Removes a cached mapping. Removing an absent key succeeds.
    async fn invalidate(&self, token: &str) -> CacheResult<()>;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;
}
