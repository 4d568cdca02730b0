//! Shared state injected into every handler.

use std::sync::Arc;

use crate::application::services::{RateGovernor, ShorteningService};

/// Application state cloned into each request.
///
/// All members are cheap to clone (`Arc` or small values).
#[derive(Clone)]
pub struct AppState {
    pub shortening_service: Arc<ShorteningService>,
    /// `None` when rate limiting is disabled.
    pub governor: Option<Arc<RateGovernor>>,
    /// Public base for building short URLs, without a trailing slash.
    pub short_url_base: String,
    /// Deployment environment reported by the health check.
    pub environment: String,
    /// When true, client identity is read from forwarding headers.
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        shortening_service: Arc<ShorteningService>,
        governor: Option<Arc<RateGovernor>>,
        short_url_base: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            shortening_service,
            governor,
            short_url_base: short_url_base.into().trim_end_matches('/').to_string(),
            environment: environment.into(),
            behind_proxy: false,
        }
    }

    pub fn with_behind_proxy(mut self, behind_proxy: bool) -> Self {
        self.behind_proxy = behind_proxy;
        self
    }

    /// Builds the public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.short_url_base, code)
    }
}
