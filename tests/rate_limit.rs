mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use clck::application::services::GovernorSettings;
use clck::infrastructure::persistence::MemoryUrlStore;
use serde_json::{Value, json};
use std::sync::Arc;

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Default burst with a refill slow enough that no token returns mid-test.
fn slow_refill() -> GovernorSettings {
    GovernorSettings {
        rate_per_second: 0.01,
        ..GovernorSettings::default()
    }
}

#[tokio::test]
async fn test_burst_then_rejected() {
    let (state, governor) =
        common::create_limited_state(Arc::new(MemoryUrlStore::new()), slow_refill());
    let server = common::test_server_from(state, "203.0.113.7:50000");

    for _ in 0..4 {
        let response = server
            .post("/shorten")
            .json(&json!({ "url": "https://example.com" }))
            .await;
        assert!(response.status_code().is_success());
    }

    let response = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json::<Value>()["error"]["code"], "rate_limited");
    assert_eq!(governor.tracked_clients(), 1);
}

#[tokio::test]
async fn test_rejected_requests_do_not_reach_store() {
    let store = Arc::new(MemoryUrlStore::new());
    let (state, _governor) = common::create_limited_state(
        store.clone(),
        GovernorSettings {
            burst: 1,
            ..slow_refill()
        },
    );
    let server = common::test_server_from(state, "203.0.113.7:50000");

    server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/first" }))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/second" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_redirects_are_not_limited() {
    let store = Arc::new(MemoryUrlStore::new());
    store.put(common::stored_record("A8SlAtQ", "https://example.com/a/b"));

    let (state, governor) = common::create_limited_state(store, slow_refill());
    let server = common::test_server_from(state, "203.0.113.7:50000");

    for _ in 0..10 {
        server
            .get("/A8SlAtQ")
            .await
            .assert_status(StatusCode::PERMANENT_REDIRECT);
    }

    assert_eq!(governor.tracked_clients(), 0);
}

#[tokio::test]
async fn test_clients_are_isolated_by_peer() {
    let (state, governor) =
        common::create_limited_state(Arc::new(MemoryUrlStore::new()), slow_refill());

    let first = common::test_server_from(state.clone(), "203.0.113.7:50000");
    let second = common::test_server_from(state, "198.51.100.9:50000");

    for _ in 0..4 {
        first
            .post("/shorten")
            .json(&json!({ "url": "https://example.com" }))
            .await;
    }

    first
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    second
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await
        .assert_status_ok();

    assert_eq!(governor.tracked_clients(), 2);
}

#[tokio::test]
async fn test_forwarded_for_ignored_without_proxy() {
    let (state, _governor) =
        common::create_limited_state(Arc::new(MemoryUrlStore::new()), slow_refill());
    let server = common::test_server_from(state, "203.0.113.7:50000");

    for i in 0..5 {
        let response = server
            .post("/shorten")
            .add_header(
                X_FORWARDED_FOR,
                HeaderValue::from_str(&format!("192.0.2.{i}")).unwrap(),
            )
            .json(&json!({ "url": "https://example.com" }))
            .await;

        if i < 4 {
            assert!(response.status_code().is_success());
        } else {
            response.assert_status(StatusCode::TOO_MANY_REQUESTS);
        }
    }
}

#[tokio::test]
async fn test_forwarded_for_used_behind_proxy() {
    let (state, governor) =
        common::create_limited_state(Arc::new(MemoryUrlStore::new()), slow_refill());
    let server = common::test_server_from(state.with_behind_proxy(true), "10.0.0.1:50000");

    for i in 0..8 {
        let response = server
            .post("/shorten")
            .add_header(
                X_FORWARDED_FOR,
                HeaderValue::from_str(&format!("192.0.2.{}, 10.0.0.1", i % 2)).unwrap(),
            )
            .json(&json!({ "url": "https://example.com" }))
            .await;

        assert!(response.status_code().is_success(), "request {i}");
    }

    assert_eq!(governor.tracked_clients(), 2);
}

#[tokio::test]
async fn test_missing_peer_shares_unknown_bucket() {
    let (state, governor) =
        common::create_limited_state(Arc::new(MemoryUrlStore::new()), slow_refill());
    let server = common::test_server(state);

    for _ in 0..4 {
        server
            .post("/shorten")
            .json(&json!({ "url": "https://example.com" }))
            .await;
    }

    server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    assert_eq!(governor.tracked_clients(), 1);
}
