//! Per-client rate limiting middleware backed by [`RateGovernor`].
//!
//! [`RateGovernor`]: crate::application::services::RateGovernor

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::debug;

use crate::{error::AppError, state::AppState, utils::client_ip::client_identity};

/// Admits or rejects a request based on its client identity.
///
/// The identity is the socket peer address, or the forwarding headers when
/// [`AppState::behind_proxy`] is set (see [`client_identity`]). Requests are
/// passed through untouched when no governor is configured.
///
/// # Errors
///
/// Returns `429 Too Many Requests` when the client's bucket is empty.
///
/// # Example
///
/// ```rust,ignore
/// let writes = Router::new()
///     .route("/shorten", post(shorten_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(governor) = &st.governor {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let identity = client_identity(req.headers(), peer, st.behind_proxy);

        if let Err(e) = governor.check(&identity) {
            debug!(client = %identity, "request rejected by rate governor");
            return Err(e);
        }
    }

    Ok(next.run(req).await)
}
