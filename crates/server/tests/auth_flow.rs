//! API key gate on the `/api/v1` subtree.

mod common;

use axum::http::{Method, StatusCode};
use common::{send_raw, test_app, API_KEY};

#[tokio::test]
async fn missing_key_is_401() {
    let app = test_app();
    let res = send_raw(&app, Method::GET, "/api/v1/users", None, None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["status"], "error");
    assert_eq!(res.body["statusCode"], 401);
    assert_eq!(
        res.body["message"],
        "API key is required. Please provide X-API-Key header."
    );
}

#[tokio::test]
async fn empty_key_counts_as_missing() {
    let app = test_app();
    let res = send_raw(&app, Method::GET, "/api/v1/users", Some(""), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_key_is_403() {
    let app = test_app();
    let res = send_raw(&app, Method::GET, "/api/v1/users", Some("wrong-key"), None).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["statusCode"], 403);
    assert_eq!(res.body["message"], "Invalid API key.");
}

#[tokio::test]
async fn near_miss_keys_are_rejected() {
    let app = test_app();
    for key in ["test-api-ke", "test-api-key2", "TEST-API-KEY"] {
        let res = send_raw(&app, Method::GET, "/api/v1/users", Some(key), None).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "key {key:?}");
    }
}

#[tokio::test]
async fn every_protected_route_is_gated() {
    let app = test_app();
    let routes = [
        (Method::GET, "/api/v1/info"),
        (Method::GET, "/api/v1/status"),
        (Method::GET, "/api/v1/users"),
        (Method::GET, "/api/v1/users/search?name=a"),
        (Method::GET, "/api/v1/users/1"),
        (Method::POST, "/api/v1/users"),
        (Method::PUT, "/api/v1/users/1"),
        (Method::DELETE, "/api/v1/users/1"),
    ];

    for (method, uri) in routes {
        let res = send_raw(&app, method.clone(), uri, None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        let res = send_raw(&app, method.clone(), uri, Some("nope"), None).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{method} {uri}");
    }
}

#[tokio::test]
async fn rejected_requests_never_reach_the_store() {
    let app = test_app();
    let body = r#"{"name": "Sneaky", "email": "sneaky@example.com"}"#;

    let res = send_raw(&app, Method::POST, "/api/v1/users", Some("bad"), Some(body)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = send_raw(&app, Method::DELETE, "/api/v1/users/1", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let list = send_raw(&app, Method::GET, "/api/v1/users", Some(API_KEY), None).await;
    assert_eq!(list.body["count"], 3);
}

#[tokio::test]
async fn valid_key_reaches_info() {
    let app = test_app();
    let res = send_raw(&app, Method::GET, "/api/v1/info", Some(API_KEY), None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["name"].is_string());
    assert!(res.body["version"].is_string());
    assert!(res.body["endpoints"].is_array());
    assert_eq!(res.body["authentication"]["type"], "API Key");
    assert_eq!(res.body["authentication"]["header"], "X-API-Key");
}

#[tokio::test]
async fn status_snapshot() {
    let app = test_app();
    let res = send_raw(&app, Method::GET, "/api/v1/status", Some(API_KEY), None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["status"], "operational");
    assert!(res.body["timestamp"].is_string());
    assert!(res.body["system"]["uptime"].is_number());
    assert_eq!(res.body["system"]["users"], 3);
}
