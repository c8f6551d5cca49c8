//! Usage statistics service.

use std::sync::Arc;

use crate::domain::entities::{ServiceStats, ShortUrl};
use crate::domain::repositories::Registry;
use crate::error::AppError;

/// Read-only view over registry counters.
///
/// Totals are recomputed from the registry on every call.
pub struct StatsService {
    registry: Arc<dyn Registry>,
}

impl StatsService {
    /// Creates a new stats service.
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    /// Returns the number of live records and the sum of their redirect counters.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] on registry failures.
    pub async fn service_stats(&self) -> Result<ServiceStats, AppError> {
        self.registry.aggregate_stats().await
    }

    /// Returns the full record for `token`, including its redirect counter.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record exists.
    pub async fn url_stats(&self, token: &str) -> Result<ShortUrl, AppError> {
        self.registry.get(token).await
    }
}
