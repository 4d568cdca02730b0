//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /healthcheck` - Health check: store and cache (public)
//! - `GET  /{code}`      - Short link redirect (public)
//! - `POST /shorten`     - Create a short link (rate limited)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Request metrics** - Per-route counts and latency
//! - **Panic recovery** - Panics become 500 responses
//! - **CORS** - Origin allow-list
//! - **Rate limiting** - Per-client token bucket on write routes
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::middleware::{cors, rate_limit, request_metrics, tracing};
use crate::state::AppState;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the router with all routes and middleware, without path normalization.
///
/// Integration tests drive this directly.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let writes = api::routes::write_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit::layer,
    ));

    Router::new()
        .merge(api::routes::public_routes())
        .merge(writes)
        .with_state(state)
        .layer(middleware::from_fn(request_metrics::layer))
        .layer(cors::layer(allowed_origins))
        .layer(CatchPanicLayer::new())
        .layer(tracing::layer())
}

/// Constructs the application service with trailing-slash normalization.
///
/// Normalization wraps the router so it runs before routing.
pub fn app_router(state: AppState, allowed_origins: &[String]) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state, allowed_origins))
}
