mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use clck::application::services::{ExpiryPolicy, ShortenerSettings};
use clck::infrastructure::persistence::MemoryUrlStore;

#[tokio::test]
async fn test_shorten_creates_link() {
    let store = Arc::new(MemoryUrlStore::new());
    let server = common::test_server(common::create_test_state(store.clone()));

    let response = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/a/b" }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let json = response.json::<Value>();
    assert_eq!(json["url"]["short_code"], "A8SlAtQ");
    assert_eq!(json["url"]["short_url"], "https://clck.test/A8SlAtQ");
    assert_eq!(json["url"]["created"], true);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_shorten_twice_returns_existing() {
    let store = Arc::new(MemoryUrlStore::new());
    let server = common::test_server(common::create_test_state(store.clone()));

    let first = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;
    first.assert_status(StatusCode::CREATED);

    let second = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;
    second.assert_status_ok();

    let json = second.json::<Value>();
    assert_eq!(json["url"]["short_code"], "yYTQaqz");
    assert_eq!(json["url"]["created"], false);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_shorten_then_redirect() {
    let server = common::test_server(common::create_test_state(Arc::new(MemoryUrlStore::new())));

    let url = "https://docs.rs/tokio/latest/tokio/?search=spawn";

    let response = server.post("/shorten").json(&json!({ "url": url })).await;
    let code = response.json::<Value>()["url"]["short_code"]
        .as_str()
        .unwrap()
        .to_string();

    let redirect = server.get(&format!("/{code}")).await;

    redirect.assert_status(StatusCode::PERMANENT_REDIRECT);
    assert_eq!(redirect.header("location"), url);
}

#[tokio::test]
async fn test_shorten_rejects_invalid_urls() {
    let store = Arc::new(MemoryUrlStore::new());
    let server = common::test_server(common::create_test_state(store.clone()));

    let cases = [
        ("", "url is required"),
        ("   ", "url is required"),
        ("example.com", "invalid url format"),
        ("ftp://example.com/file", "invalid url format"),
        ("http://localhost:8080/admin", "private/internal urls not allowed"),
        ("http://10.0.0.1/", "private/internal urls not allowed"),
    ];

    for (url, message) in cases {
        let response = server.post("/shorten").json(&json!({ "url": url })).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let json = response.json::<Value>();
        assert_eq!(json["error"]["code"], "validation_error", "{url:?}");
        assert_eq!(json["error"]["details"]["url"], message, "{url:?}");
    }

    assert!(store.is_empty());
}

#[tokio::test]
async fn test_shorten_rejects_oversized_url() {
    let server = common::test_server(common::create_test_state(Arc::new(MemoryUrlStore::new())));

    let url = format!("https://example.com/{}", "a".repeat(2000));

    let response = server.post("/shorten").json(&json!({ "url": url })).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"]["details"]["url"], "url too long");
}

#[tokio::test]
async fn test_shorten_missing_field() {
    let server = common::test_server(common::create_test_state(Arc::new(MemoryUrlStore::new())));

    let response = server.post("/shorten").json(&json!({})).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"]["details"]["url"], "url is required");
}

#[tokio::test]
async fn test_shorten_malformed_body() {
    let server = common::test_server(common::create_test_state(Arc::new(MemoryUrlStore::new())));

    let response = server
        .post("/shorten")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_shorten_collision_is_conflict() {
    let store = Arc::new(MemoryUrlStore::new());
    store.put(common::stored_record("A8SlAtQ", "https://other.example.com/"));

    let server = common::test_server(common::create_test_state(store.clone()));

    let response = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/a/b" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);

    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "collision");
    assert_eq!(json["error"]["details"]["code"], "A8SlAtQ");

    let redirect = server.get("/A8SlAtQ").await;
    assert_eq!(redirect.header("location"), "https://other.example.com/");
}

#[tokio::test]
async fn test_shorten_expired_link_enforced_is_gone() {
    let store = Arc::new(MemoryUrlStore::new());
    store.put(common::expired_record("A8SlAtQ", "https://example.com/a/b"));

    let service = common::service_over(
        store.clone(),
        ShortenerSettings {
            expiry_policy: ExpiryPolicy::Enforce,
            ..ShortenerSettings::default()
        },
    );
    let state = clck::state::AppState::new(service, None, common::TEST_BASE, "test");
    let server = common::test_server(state);

    let response = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com/a/b" }))
        .await;

    response.assert_status(StatusCode::GONE);
    assert_eq!(response.json::<Value>()["error"]["code"], "expired");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_shorten_store_down_is_unavailable() {
    let service = common::service_over(
        Arc::new(common::UnavailableStore),
        ShortenerSettings::default(),
    );
    let state = clck::state::AppState::new(service, None, common::TEST_BASE, "test");
    let server = common::test_server(state);

    let response = server
        .post("/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "store_unavailable");
    assert!(!json["error"]["message"].as_str().unwrap().contains("refused"));
}

#[tokio::test]
async fn test_cors_preflight_allows_known_origin() {
    let server = common::test_server(common::create_test_state(Arc::new(MemoryUrlStore::new())));

    let response = server
        .method(axum::http::Method::OPTIONS, "/shorten")
        .add_header(
            axum::http::header::ORIGIN,
            axum::http::HeaderValue::from_static(common::TEST_ORIGIN),
        )
        .add_header(
            axum::http::header::ACCESS_CONTROL_REQUEST_METHOD,
            axum::http::HeaderValue::from_static("POST"),
        )
        .await;

    assert_eq!(
        response.header("access-control-allow-origin"),
        common::TEST_ORIGIN
    );
    assert_eq!(response.header("access-control-allow-credentials"), "true");
}
