//! Background removal of expired short URLs.
//!
//! Each pass pages through expired records in expiration order, a batch at a
//! time, and deletes them from the registry and the cache. A token that fails
//! is logged, skipped for the rest of the pass and retried on the next one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::repositories::Registry;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

/// Outcome of one sweeper pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tokens returned by the expiration index.
    pub scanned: usize,
    /// Tokens removed from the registry.
    pub purged: usize,
    /// Tokens that could not be removed this pass.
    pub failed: usize,
}

pub struct ExpirationSweeper {
    registry: Arc<dyn Registry>,
    cache: Arc<dyn CacheService>,
    interval: Duration,
    batch_size: i64,
}

impl ExpirationSweeper {
    pub fn new(
        registry: Arc<dyn Registry>,
        cache: Arc<dyn CacheService>,
        interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            registry,
            cache,
            interval,
            batch_size: batch_size.max(1),
        }
    }

    /// Removes every record whose expiration is at or before `now`.
    ///
    /// Records are re-read before deletion, so one extended or replaced
    /// between listing and deleting is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] only if listing expired tokens fails.
    /// Per-token failures are counted in [`SweepReport::failed`].
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
        let mut report = SweepReport::default();
        let mut cursor = None;

        loop {
            let batch = self
                .registry
                .list_expired(now, cursor.take(), self.batch_size)
                .await?;
            let batch_len = batch.len();
            report.scanned += batch_len;

            for entry in &batch {
                match self.purge(&entry.token, now).await {
                    Ok(true) => report.purged += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(token = %entry.token, error = %e, "Failed to purge expired short URL");
                        report.failed += 1;
                    }
                }
            }

            // Each page starts after the previous one, so a failing token is
            // visited once per pass.
            cursor = batch.into_iter().last();
            if (batch_len as i64) < self.batch_size {
                break;
            }
        }

        metrics::counter!("sweeper_purged_total").increment(report.purged as u64);
        metrics::counter!("sweeper_failures_total").increment(report.failed as u64);

        Ok(report)
    }

    async fn purge(&self, token: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let record = match self.registry.get(token).await {
            Ok(record) => record,
            Err(AppError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };

        if !record.is_expired_at(now) {
            debug!(token = %token, "Record no longer expired, skipping");
            return Ok(false);
        }

        match self.registry.delete(token).await {
            Ok(()) => {}
            Err(AppError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        }

        if let Err(e) = self.cache.invalidate(token).await {
            warn!(token = %token, error = %e, "Failed to invalidate cache for expired URL");
        }

        Ok(true)
    }

    /// Runs [`Self::run_once`] every `interval` until the task is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(
                interval_secs = self.interval.as_secs(),
                batch_size = self.batch_size,
                "Expiration sweeper started"
            );

            loop {
                ticker.tick().await;

                match self.run_once(Utc::now()).await {
                    Ok(report) if report.scanned > 0 => info!(
                        scanned = report.scanned,
                        purged = report.purged,
                        failed = report.failed,
                        "Expiration sweep finished"
                    ),
                    Ok(_) => debug!("Expiration sweep found nothing to purge"),
                    Err(e) => warn!(error = %e, "Expiration sweep failed"),
                }
            }
        })
    }
}
