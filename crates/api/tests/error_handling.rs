//! `AppError` to HTTP response mapping, exercised without a server.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use layoutsmith_api::error::AppError;
use layoutsmith_core::error::CoreError;
use layoutsmith_db::StoreError;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn not_found_names_entity_and_id() {
    let (status, json) = render(AppError::Core(CoreError::NotFound {
        entity: "GeneratedLayout",
        id: 42,
    }))
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "GeneratedLayout with id 42 not found");
}

#[tokio::test]
async fn validation_is_400() {
    let (status, json) =
        render(AppError::Core(CoreError::Validation("title must not be empty".into()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "title must not be empty");
}

#[tokio::test]
async fn forbidden_and_unauthorized_are_distinct() {
    let (status, json) = render(AppError::Core(CoreError::Forbidden("no".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");

    let (status, json) = render(AppError::Core(CoreError::Unauthorized("who".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn dependency_failure_hides_upstream_detail() {
    let (status, json) = render(AppError::Core(CoreError::DependencyFailure(
        "https://api.internal returned 503".into(),
    )))
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "DEPENDENCY_FAILURE");
    assert!(!json["error"].as_str().unwrap().contains("api.internal"));
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    let (status, json) = render(AppError::Core(CoreError::Internal(
        "cycle detected at node 7".into(),
    )))
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");

    let (status, json) = render(AppError::InternalError("hash failed".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn duplicate_constraint_maps_to_friendly_conflict() {
    let (status, json) = render(AppError::Store(StoreError::Duplicate {
        constraint: "uq_generated_layouts_owner_root_title".into(),
    }))
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "You already have a layout with this title");
}

#[tokio::test]
async fn store_rule_is_classified_like_core_error() {
    let (status, json) = render(AppError::Store(StoreError::Rule(CoreError::Conflict(
        "Invitation 3 has already been accepted".into(),
    ))))
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "Invitation 3 has already been accepted");
}
