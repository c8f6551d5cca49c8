//! Repository trait for the durable short URL registry.

use crate::domain::entities::{ExpiredEntry, NewShortUrl, ServiceStats, ShortUrl};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Authoritative store of short URL records and their redirect counters.
///
/// Implementations must be safe to share between concurrent requests. No
/// application-level locking is layered on top; consistency comes from the
/// backing store.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRegistry`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryRegistry`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Registry: Send + Sync {
    /// Persists a new record with `redirects = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the token is already taken.
    /// Returns [`AppError::Storage`] on database errors.
    async fn create(&self, new_url: NewShortUrl) -> Result<ShortUrl, AppError>;

    /// Reads a record by token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has this token.
    /// Returns [`AppError::Storage`] on database errors.
    async fn get(&self, token: &str) -> Result<ShortUrl, AppError>;

    /// Writes back the mutable fields of `record` (only `redirects`).
    ///
    /// This is a plain overwrite: two concurrent read-modify-write cycles on the
    /// same token can lose an increment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record no longer exists.
    /// Returns [`AppError::Storage`] on database errors.
    async fn update(&self, record: &ShortUrl) -> Result<(), AppError>;

    /// Atomically adds one to `redirects` and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has this token.
    /// Returns [`AppError::Storage`] on database errors.
    async fn increment_redirects(&self, token: &str) -> Result<i64, AppError>;

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record has this token.
    /// Returns [`AppError::Storage`] on database errors.
    async fn delete(&self, token: &str) -> Result<(), AppError>;

    /// Removes every record in a single atomic step and returns their tokens.
    ///
    /// Either all records present at the time of the call are removed or none are.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on database errors.
    async fn delete_all(&self) -> Result<Vec<String>, AppError>;

    /// Lists every live token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on database errors.
    async fn list_tokens(&self) -> Result<Vec<String>, AppError>;

    /// Lists up to `limit` records whose expiration is at or before `now`,
    /// in [`ExpiredEntry`] order, starting strictly after `after`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on database errors.
    async fn list_expired(
        &self,
        now: DateTime<Utc>,
        after: Option<ExpiredEntry>,
        limit: i64,
    ) -> Result<Vec<ExpiredEntry>, AppError>;

    /// Counts records and sums their redirect counters. An empty registry yields zeros.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on database errors.
    async fn aggregate_stats(&self) -> Result<ServiceStats, AppError>;

    /// Checks that the backing store answers.
    async fn ping(&self) -> bool;
}
