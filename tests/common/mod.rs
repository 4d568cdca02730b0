#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{Duration as ChronoDuration, Utc};
use clck::application::services::{
    GovernorSettings, RateGovernor, ShortenerSettings, ShorteningService,
};
use clck::domain::entities::{NewUrlRecord, UrlRecord};
use clck::domain::repositories::{StoreError, UrlStore};
use clck::infrastructure::cache::NullCache;
use clck::infrastructure::persistence::MemoryUrlStore;
use clck::routes::build_router;
use clck::state::AppState;
use clck::utils::code_generator::HashCodeGenerator;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const TEST_BASE: &str = "https://clck.test";
pub const TEST_ORIGIN: &str = "http://localhost:3000";

/// Inserts a fixed peer address, standing in for `into_make_service_with_connect_info`.
#[derive(Clone)]
pub struct MockConnectInfoLayer(pub SocketAddr);

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.0,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}

/// Store whose every call fails as unavailable.
pub struct UnavailableStore;

#[async_trait]
impl UrlStore for UnavailableStore {
    async fn lookup(&self, _short_code: &str) -> Result<Option<UrlRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn insert(&self, _new_record: NewUrlRecord) -> Result<UrlRecord, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

pub fn service_over(store: Arc<dyn UrlStore>, settings: ShortenerSettings) -> Arc<ShorteningService> {
    Arc::new(ShorteningService::new(
        store,
        Arc::new(NullCache::new()),
        Arc::new(HashCodeGenerator::default()),
        settings,
    ))
}

/// State over an in-memory store, without rate limiting.
pub fn create_test_state(store: Arc<MemoryUrlStore>) -> AppState {
    AppState::new(
        service_over(store, ShortenerSettings::default()),
        None,
        TEST_BASE,
        "test",
    )
}

/// State over an in-memory store with a governor that never sweeps on its own.
pub fn create_limited_state(
    store: Arc<MemoryUrlStore>,
    settings: GovernorSettings,
) -> (AppState, Arc<RateGovernor>) {
    let governor = Arc::new(RateGovernor::new(settings));

    let state = AppState::new(
        service_over(store, ShortenerSettings::default()),
        Some(governor.clone()),
        TEST_BASE,
        "test",
    );

    (state, governor)
}

pub fn test_server(state: AppState) -> TestServer {
    TestServer::new(build_router(state, &[TEST_ORIGIN.to_string()])).unwrap()
}

pub fn test_server_from(state: AppState, peer: &str) -> TestServer {
    let addr: SocketAddr = peer.parse().unwrap();
    let app = build_router(state, &[TEST_ORIGIN.to_string()]).layer(MockConnectInfoLayer(addr));

    TestServer::new(app).unwrap()
}

pub fn stored_record(code: &str, url: &str) -> UrlRecord {
    let now = Utc::now();
    UrlRecord::new(
        code.to_string(),
        url.to_string(),
        now,
        now + ChronoDuration::days(7),
    )
}

pub fn expired_record(code: &str, url: &str) -> UrlRecord {
    let now = Utc::now();
    UrlRecord::new(
        code.to_string(),
        url.to_string(),
        now - ChronoDuration::days(8),
        now - ChronoDuration::days(1),
    )
}
