//! Shared helpers for driving the router in-process.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_router, ServerConfig, ServerState};
use tower::util::ServiceExt; // for `oneshot`

pub const API_KEY: &str = "test-api-key";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        api_key: API_KEY.to_string(),
        rate_limit_max_requests: 1000, // High limit for tests
        ..ServerConfig::default()
    }
}

/// Create a test server state seeded with the three demo users
pub fn create_test_state() -> Arc<ServerState> {
    Arc::new(ServerState::new(test_config()).expect("Failed to create test state"))
}

pub fn test_app() -> Router {
    build_router(create_test_state())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

/// Send one request. `key` is sent as `X-API-Key` when present; `body` is
/// sent raw with a JSON content type.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    key: Option<&str>,
    body: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(raw) => builder
            .header("content-type", "application/json")
            .body(Body::from(raw.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body should be JSON")
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Authenticated request with an optional JSON body.
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let raw = body.map(|b| b.to_string());
    send_raw(app, method, uri, Some(API_KEY), raw.as_deref()).await
}
