//! Deadline helper for registry calls.

use std::future::Future;
use std::time::Duration;

use serde_json::json;

use crate::error::AppError;

/// Runs `fut` with a deadline; running out of time is reported as a storage error.
pub async fn bounded<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::storage(
            "Registry operation timed out",
            json!({ "operation": operation, "timeout_ms": limit.as_millis() as u64 }),
        )),
    }
}
