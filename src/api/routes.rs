//! API route configuration.

use crate::api::handlers::{
    delete_all_handler, delete_handler, health_handler, redirect_handler, register_handler,
    service_stats_handler, url_stats_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All service routes.
///
/// # Endpoints
///
/// - `POST   /`              - Register a URL
/// - `DELETE /`              - Delete every record
/// - `GET    /health`        - Component health
/// - `GET    /stats`         - Service-wide totals
/// - `GET    /stats/{token}` - Full record for one token
/// - `GET    /{token}`       - Redirect
/// - `DELETE /{token}`       - Delete one record
///
/// Static segments shadow `/{token}`; the token generator never yields
/// `stats` or `health`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(register_handler).delete(delete_all_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(service_stats_handler))
        .route("/stats/{token}", get(url_stats_handler))
        .route("/{token}", get(redirect_handler).delete(delete_handler))
}
