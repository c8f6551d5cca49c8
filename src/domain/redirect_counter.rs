//! Asynchronous redirect counting.
//!
//! Redirect handlers call [`RedirectCounter::record`], which enqueues a job
//! and returns immediately. A background worker drains the queue and updates
//! the registry, running up to `concurrency` jobs at once. No ordering is
//! guaranteed between jobs for the same token.
//!
//! # Strategies
//!
//! - [`CounterStrategy::Atomic`] - a single store-level increment per job
//! - [`CounterStrategy::ReadModifyWrite`] - read the record, add one, write it
//!   back; two overlapping jobs for the same token can lose an increment

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, Semaphore, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::repositories::Registry;
use crate::error::AppError;

/// How a redirect is applied to the stored counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterStrategy {
    #[default]
    Atomic,
    ReadModifyWrite,
}

impl FromStr for CounterStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(Self::Atomic),
            "read_modify_write" | "read-modify-write" => Ok(Self::ReadModifyWrite),
            other => Err(format!(
                "unknown counter strategy '{}', expected 'atomic' or 'read_modify_write'",
                other
            )),
        }
    }
}

/// Tuning for the counter queue and worker.
#[derive(Debug, Clone)]
pub struct CounterOptions {
    pub strategy: CounterStrategy,
    pub queue_capacity: usize,
    pub concurrency: usize,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            strategy: CounterStrategy::Atomic,
            queue_capacity: 10_000,
            concurrency: 4,
        }
    }
}

type CountResult = Result<i64, AppError>;

struct CountJob {
    token: String,
    done: oneshot::Sender<CountResult>,
}

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn leave(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Completion handle for one recorded redirect.
///
/// Handlers drop it; tests await it to observe the outcome.
pub struct PendingCount {
    rx: oneshot::Receiver<CountResult>,
}

impl PendingCount {
    /// Waits for the job and returns the counter value it wrote.
    ///
    /// # Errors
    ///
    /// Returns the registry error that stopped the update, or
    /// [`AppError::Internal`] if the job was dropped before running.
    pub async fn wait(self) -> CountResult {
        self.rx.await.unwrap_or_else(|_| {
            Err(AppError::internal(
                "Redirect count job was dropped",
                json!({}),
            ))
        })
    }
}

/// Handle to the redirect counting queue. Cheap to clone.
#[derive(Clone)]
pub struct RedirectCounter {
    tx: mpsc::Sender<CountJob>,
    in_flight: Arc<InFlight>,
}

impl RedirectCounter {
    /// Starts the background worker and returns a handle to its queue.
    ///
    /// The worker stops once every handle has been dropped and the queue is drained.
    pub fn spawn(registry: Arc<dyn Registry>, options: CounterOptions) -> (Self, JoinHandle<()>) {
        let (counter, rx) = Self::detached(options.queue_capacity);
        let worker = tokio::spawn(run_counter_worker(
            rx,
            registry,
            options.strategy,
            options.concurrency.max(1),
            counter.in_flight.clone(),
        ));
        (counter, worker)
    }

    fn detached(queue_capacity: usize) -> (Self, mpsc::Receiver<CountJob>) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let counter = Self {
            tx,
            in_flight: Arc::new(InFlight::default()),
        };
        (counter, rx)
    }

    /// Enqueues one redirect for `token` without waiting.
    ///
    /// A full or closed queue drops the job; the returned handle then resolves
    /// to an error and the drop is logged.
    pub fn record(&self, token: &str) -> PendingCount {
        let (done, rx) = oneshot::channel();
        let job = CountJob {
            token: token.to_string(),
            done,
        };

        metrics::counter!("redirects_total").increment(1);
        self.in_flight.enter();

        if let Err(e) = self.tx.try_send(job) {
            let (job, reason) = match e {
                TrySendError::Full(job) => (job, "Redirect counter queue is full"),
                TrySendError::Closed(job) => (job, "Redirect counter queue is closed"),
            };
            warn!(token = %job.token, "{}; increment dropped", reason);
            metrics::counter!("redirect_count_dropped_total").increment(1);
            let _ = job
                .done
                .send(Err(AppError::internal(reason, json!({ "token": token }))));
            self.in_flight.leave();
        }

        PendingCount { rx }
    }

    /// Resolves once no job is queued or running.
    pub async fn wait_idle(&self) {
        self.in_flight.wait_idle().await;
    }

    /// Returns true if the worker has stopped accepting jobs.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots left in the queue.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

async fn run_counter_worker(
    mut rx: mpsc::Receiver<CountJob>,
    registry: Arc<dyn Registry>,
    strategy: CounterStrategy,
    concurrency: usize,
    in_flight: Arc<InFlight>,
) {
    let permits = Arc::new(Semaphore::new(concurrency));

    while let Some(job) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let registry = registry.clone();
        let in_flight = in_flight.clone();

        tokio::spawn(async move {
            let result = count_redirect(registry.as_ref(), &job.token, strategy).await;

            match &result {
                Ok(redirects) => debug!(token = %job.token, redirects, "Redirect counted"),
                Err(e) => {
                    warn!(token = %job.token, error = %e, "Failed to update redirect counter");
                    metrics::counter!("redirect_count_failures_total").increment(1);
                }
            }

            let _ = job.done.send(result);
            drop(permit);
            in_flight.leave();
        });
    }

    debug!("Redirect counter worker stopped");
}

/// Applies one redirect to the stored counter of `token`.
///
/// With [`CounterStrategy::ReadModifyWrite`] a failed read means no write is
/// attempted, and a failed write loses the increment.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the record is gone and
/// [`AppError::Storage`] on registry failures.
pub async fn count_redirect(
    registry: &dyn Registry,
    token: &str,
    strategy: CounterStrategy,
) -> CountResult {
    match strategy {
        CounterStrategy::Atomic => registry.increment_redirects(token).await,
        CounterStrategy::ReadModifyWrite => {
            let mut record = registry.get(token).await?;
            record.redirects += 1;
            registry.update(&record).await?;
            Ok(record.redirects)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{NewShortUrl, ShortUrl};
    use crate::domain::repositories::MockRegistry;
    use crate::infrastructure::persistence::MemoryRegistry;
    use chrono::{Duration, Utc};

    async fn registry_with(token: &str) -> Arc<MemoryRegistry> {
        let registry = Arc::new(MemoryRegistry::new());
        registry
            .create(NewShortUrl::new(
                token.to_string(),
                "https://example.com".to_string(),
                "http://localhost:3000",
                Utc::now() + Duration::minutes(10),
            ))
            .await
            .unwrap();
        registry
    }

    fn sample_record(token: &str, redirects: i64) -> ShortUrl {
        ShortUrl {
            token: token.to_string(),
            url: "https://example.com".to_string(),
            shortened_url: format!("http://localhost:3000/{token}"),
            expiration: Utc::now() + Duration::minutes(10),
            redirects,
        }
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("atomic".parse(), Ok(CounterStrategy::Atomic));
        assert_eq!(
            "read_modify_write".parse(),
            Ok(CounterStrategy::ReadModifyWrite)
        );
        assert_eq!(
            "Read-Modify-Write".parse(),
            Ok(CounterStrategy::ReadModifyWrite)
        );
        assert!("optimistic".parse::<CounterStrategy>().is_err());
    }

    #[tokio::test]
    async fn test_record_and_wait_returns_new_value() {
        let registry = registry_with("abc").await;
        let (counter, _worker) = RedirectCounter::spawn(registry.clone(), CounterOptions::default());

        assert_eq!(counter.record("abc").wait().await.unwrap(), 1);
        assert_eq!(counter.record("abc").wait().await.unwrap(), 2);
        assert_eq!(registry.get("abc").await.unwrap().redirects, 2);
    }

    #[tokio::test]
    async fn test_wait_idle_sees_every_atomic_increment() {
        let registry = registry_with("abc").await;
        let (counter, _worker) = RedirectCounter::spawn(
            registry.clone(),
            CounterOptions {
                concurrency: 16,
                ..CounterOptions::default()
            },
        );

        for _ in 0..50 {
            let _ = counter.record("abc");
        }
        counter.wait_idle().await;

        assert_eq!(registry.get("abc").await.unwrap().redirects, 50);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_without_jobs() {
        let registry = Arc::new(MemoryRegistry::new());
        let (counter, _worker) = RedirectCounter::spawn(registry, CounterOptions::default());
        counter.wait_idle().await;
    }

    #[tokio::test]
    async fn test_unknown_token_reports_not_found() {
        let registry = Arc::new(MemoryRegistry::new());
        let (counter, _worker) = RedirectCounter::spawn(registry, CounterOptions::default());

        let err = counter.record("ghost").wait().await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_read_failure_skips_write() {
        let mut mock = MockRegistry::new();
        mock.expect_get()
            .times(1)
            .returning(|t| Err(AppError::not_found("Short URL not found", json!({ "token": t }))));
        mock.expect_update().times(0);

        let err = count_redirect(&mock, "gone", CounterStrategy::ReadModifyWrite)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_write_failure_loses_increment() {
        let mut mock = MockRegistry::new();
        mock.expect_get()
            .times(1)
            .returning(|t| Ok(sample_record(t, 3)));
        mock.expect_update()
            .withf(|r| r.redirects == 4)
            .times(1)
            .returning(|_| Err(AppError::storage("Database error", json!({}))));

        let err = count_redirect(&mock, "abc", CounterStrategy::ReadModifyWrite)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_atomic_strategy_never_reads() {
        let mut mock = MockRegistry::new();
        mock.expect_get().times(0);
        mock.expect_increment_redirects()
            .times(1)
            .returning(|_| Ok(8));

        let value = count_redirect(&mock, "abc", CounterStrategy::Atomic)
            .await
            .unwrap();
        assert_eq!(value, 8);
    }

    #[tokio::test]
    async fn test_full_queue_drops_job() {
        let (counter, _rx) = RedirectCounter::detached(1);

        let _first = counter.record("abc");
        let second = counter.record("abc");

        let err = second.wait().await.unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(counter.in_flight.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closed_queue_drops_job() {
        let (counter, rx) = RedirectCounter::detached(4);
        drop(rx);

        assert!(counter.is_closed());
        assert!(counter.record("abc").wait().await.is_err());
        counter.wait_idle().await;
    }
}
