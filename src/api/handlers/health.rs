//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Registry**: Round trip to the backing store
/// 2. **Cache**: Backend ping
/// 3. **Counter queue**: Worker still accepting jobs, free capacity
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let registry = if state.registry.ping().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Registry unreachable")
    };

    let cache = if state.cache.health_check().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Cache unreachable")
    };

    let counter_queue = if state.counter.is_closed() {
        CheckStatus::error("Redirect counter queue is closed")
    } else {
        CheckStatus::ok(format!("Free capacity: {}", state.counter.capacity()))
    };

    let all_healthy = registry.is_ok() && cache.is_ok() && counter_queue.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            registry,
            cache,
            counter_queue,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
