//! In-process cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    url: String,
    deadline: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// A cache held in process memory.
///
/// Entries carry their own deadline and are evicted lazily when a read finds
/// them expired. Used when Redis is not configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        debug!("Using in-memory cache");
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, token: &str) -> CacheResult<String> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(token) else {
            return Err(CacheError::Miss(token.to_string()));
        };

        if entry.is_expired(now) {
            drop(entry);
            self.entries
                .remove_if(token, |_, e| e.is_expired(Instant::now()));
            return Err(CacheError::Miss(token.to_string()));
        }

        Ok(entry.url.clone())
    }

    async fn set_url(&self, token: &str, url: &str, ttl: Duration) -> CacheResult<()> {
        let deadline = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::OperationError(format!("TTL too large for {}", token)))?;

        self.entries.insert(
            token.to_string(),
            Entry {
                url: url.to_string(),
                deadline,
            },
        );
        Ok(())
    }

    async fn invalidate(&self, token: &str) -> CacheResult<()> {
        self.entries.remove(token);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
