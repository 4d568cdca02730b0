//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Errors
///
/// - 404 Not Found for unknown or malformed codes
/// - 410 Gone for expired links when expiry is enforced
/// - 503 Service Unavailable when the store cannot be reached
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let target_url = state.shortening_service.resolve(&code).await?;

    debug!(%code, "redirecting");

    Ok(Redirect::permanent(&target_url))
}
