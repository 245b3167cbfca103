//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get};
use tower::ServiceExt;

#[tokio::test]
async fn health_check_reports_storage() {
    let app = common::build_test_app();
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["storage_healthy"], true);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app();
    let response = get(app, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_carries_request_id() {
    let app = common::build_test_app();
    let response = get(app, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap();
    assert_eq!(request_id.len(), 36, "x-request-id should be a UUID string");
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let app = common::build_test_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/layouts")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
}
