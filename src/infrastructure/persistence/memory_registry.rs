//! In-process implementation of the registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::json;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

use crate::domain::entities::{ExpiredEntry, NewShortUrl, ServiceStats, ShortUrl};
use crate::domain::repositories::Registry;
use crate::error::AppError;

/// Registry held in process memory.
///
/// Records live in a `DashMap`; a `BTreeSet` ordered by expiration lets the
/// sweeper find expired tokens without visiting every record. Structural
/// changes (create, delete) take the index lock so both stay in step; counter
/// updates only touch the map shard.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    records: DashMap<String, ShortUrl>,
    by_expiration: Mutex<BTreeSet<(DateTime<Utc>, String)>>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self) -> MutexGuard<'_, BTreeSet<(DateTime<Utc>, String)>> {
        match self.by_expiration.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Registry index mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn not_found(token: &str) -> AppError {
    AppError::not_found("Short URL not found", json!({ "token": token }))
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError> {
        let mut index = self.index();

        match self.records.entry(new_url.token.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "short_urls_token_key", "token": new_url.token }),
            )),
            Entry::Vacant(slot) => {
                let record = new_url.into_record();
                index.insert((record.expiration, record.token.clone()));
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn get(&self, token: &str) -> Result<ShortUrl, AppError> {
        self.records
            .get(token)
            .map(|r| r.value().clone())
            .ok_or_else(|| not_found(token))
    }

    async fn update(&self, record: &ShortUrl) -> Result<(), AppError> {
        let mut stored = self
            .records
            .get_mut(&record.token)
            .ok_or_else(|| not_found(&record.token))?;
        stored.redirects = record.redirects;
        Ok(())
    }

    async fn increment_redirects(&self, token: &str) -> Result<i64, AppError> {
        let mut stored = self.records.get_mut(token).ok_or_else(|| not_found(token))?;
        stored.redirects += 1;
        Ok(stored.redirects)
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        let mut index = self.index();

        let (_, removed) = self.records.remove(token).ok_or_else(|| not_found(token))?;
        index.remove(&(removed.expiration, removed.token));
        Ok(())
    }

    async fn delete_all(&self) -> Result<Vec<String>, AppError> {
        let mut index = self.index();

        let tokens: Vec<String> = index.iter().map(|(_, token)| token.clone()).collect();
        self.records.clear();
        index.clear();
        Ok(tokens)
    }

    async fn list_tokens(&self) -> Result<Vec<String>, AppError> {
        Ok(self.records.iter().map(|r| r.key().clone()).collect())
    }

    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        after: Option<ExpiredEntry>,
        limit: i64,
    ) -> Result<Vec<ExpiredEntry>, AppError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let start = match after {
            Some(cursor) => Bound::Excluded((cursor.expiration, cursor.token)),
            None => Bound::Unbounded,
        };
        let index = self.index();

        Ok(index
            .range((start, Bound::Unbounded))
            .take_while(|(expiration, _)| *expiration <= now)
            .take(limit)
            .map(|(expiration, token)| ExpiredEntry {
                expiration: *expiration,
                token: token.clone(),
            })
            .collect())
    }

    async fn aggregate_stats(&self) -> Result<ServiceStats, AppError> {
        let stats = self
            .records
            .iter()
            .fold(ServiceStats::default(), |mut acc, r| {
                acc.total_urls += 1;
                acc.total_redirects += r.redirects;
                acc
            });
        Ok(stats)
    }

    async fn ping(&self) -> bool {
        true
    }
}
