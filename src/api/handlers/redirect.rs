//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a token to its URL.
///
/// # Endpoint
///
/// `GET /{token}`
///
/// # Request Flow
///
/// 1. Look the token up in the cache
/// 2. Enqueue a redirect count for the token
/// 3. Return `302 Found` with `Location`
///
/// The registry is never consulted here. Counting happens after the
/// response and its outcome is not reported to the client.
///
/// # Errors
///
/// Returns 500 with code `cache_miss` if the cache has no entry, even when the
/// registry still holds the record.
pub async fn redirect_handler(
    Path(token): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let url = state.cache.get_url(&token).await.inspect_err(|e| {
        debug!(token = %token, error = %e, "Redirect cache lookup failed");
    })?;

    let location = HeaderValue::try_from(url.as_str()).map_err(|e| {
        AppError::internal(
            "Stored URL is not a valid Location header",
            json!({ "token": token, "reason": e.to_string() }),
        )
    })?;

    drop(state.counter.record(&token));

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}
