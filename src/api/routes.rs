//! API route configuration.

use crate::api::handlers::{health_handler, redirect_handler, shorten_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Read-only routes, never rate limited.
///
/// # Endpoints
///
/// - `GET /healthcheck` - Store and cache status
/// - `GET /{code}`      - Permanent redirect to the target URL
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(health_handler))
        .route("/{code}", get(redirect_handler))
}

/// Routes that create state, guarded by the rate governor.
///
/// # Endpoints
///
/// - `POST /shorten` - Create or fetch the short link for a URL
pub fn write_routes() -> Router<AppState> {
    Router::new().route("/shorten", post(shorten_handler))
}
