//! Handlers for usage statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::domain::entities::{ServiceStats, ShortUrl};
use crate::error::AppError;
use crate::state::AppState;

/// Returns service-wide totals.
///
/// # Endpoint
///
/// `GET /stats`
///
/// # Response
///
/// ```json
/// { "totalURLs": 2, "totalRedirects": 17 }
/// ```
///
/// Totals are recomputed from the registry on every request.
pub async fn service_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<ServiceStats>, AppError> {
    let stats = state.stats_service.service_stats().await?;
    Ok(Json(stats))
}

/// Returns the full record for one token.
///
/// # Endpoint
///
/// `GET /stats/{token}`
///
/// # Errors
///
/// Returns 404 Not Found if the token is unknown.
pub async fn url_stats_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ShortUrl>, AppError> {
    let record = state.stats_service.url_stats(&token).await?;
    Ok(Json(record))
}
