//! Handlers for deleting short URLs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

/// Deletes one short URL and its cache entry.
///
/// # Endpoint
///
/// `DELETE /{token}`
///
/// # Errors
///
/// Returns 404 Not Found if the token is unknown, so a second delete of the
/// same token fails.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(&token).await?;
    info!(token = %token, "Short URL deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes every short URL.
///
/// # Endpoint
///
/// `DELETE /`
///
/// The configured delete-all policy decides what a registry failure does:
/// `best_effort` skips the failing token and still answers 204,
/// `all_or_nothing` deletes nothing and answers 500.
pub async fn delete_all_handler(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let report = state
        .link_service
        .delete_all(state.delete_all_policy)
        .await?;

    info!(
        deleted = report.deleted,
        failed = report.failed,
        policy = ?state.delete_all_policy,
        "Delete-all finished"
    );

    Ok(StatusCode::NO_CONTENT)
}
