//! Handler for short URL registration.

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use validator::Validate;

use crate::api::dto::register::RegisterRequest;
use crate::domain::entities::ShortUrl;
use crate::error::AppError;
use crate::state::AppState;

/// Registers a URL under a new token.
///
/// # Endpoint
///
/// `POST /`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com", "ttl": "10m" }
/// ```
///
/// # Response
///
/// `201 Created` with the stored record:
///
/// ```json
/// {
///   "url": "https://example.com",
///   "token": "q3Zk1_Ab",
///   "shortenedURL": "http://localhost:3000/q3Zk1_Ab",
///   "expiration": "2025-01-01T12:10:00Z",
///   "redirects": 0
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for a malformed body, an invalid URL or TTL.
/// Returns 500 if the registry or the cache write fails; in the latter case
/// the record has been stored.
pub async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortUrl>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let record = state
        .link_service
        .register(&payload.url, &payload.ttl)
        .await?;

    tracing::info!(token = %record.token, expiration = %record.expiration, "Short URL registered");

    Ok((StatusCode::CREATED, Json(record)))
}
