//! HTTP-level tests for categories, tags and layout-tag associations.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, generate_layout, get_auth, post_auth, post_json_auth, put_json_auth,
    register_and_login,
};
use serde_json::json;

async fn create(app: &axum::Router, token: &str, resource: &str, name: &str) -> i64 {
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/{resource}"),
        json!({ "name": name }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn category_crud_and_defaults() {
    let app = common::build_test_app();
    let (_, token) = register_and_login(&app, "alice").await;

    let response = post_json_auth(
        app.clone(),
        "/api/v1/categories",
        json!({ "name": " Marketing ", "description": "Campaign pages" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Marketing");
    assert_eq!(json["data"]["color"], "#6366F1");
    let id = json["data"]["id"].as_i64().unwrap();

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/categories/{id}"),
        json!({ "color": "#00ff00" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["color"], "#00FF00");
    assert_eq!(json["data"]["name"], "Marketing");

    let response = post_json_auth(
        app.clone(),
        "/api/v1/categories",
        json!({ "name": "Marketing" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json_auth(
        app,
        "/api/v1/categories",
        json!({ "name": "Bad", "color": "green" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn null_description_clears_it_and_omission_keeps_it() {
    let app = common::build_test_app();
    let (_, token) = register_and_login(&app, "alice").await;

    for resource in ["categories", "tags"] {
        let response = post_json_auth(
            app.clone(),
            &format!("/api/v1/{resource}"),
            json!({ "name": "Launch", "description": "Release week" }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = body_json(response).await["data"]["id"].as_i64().unwrap();
        let uri = format!("/api/v1/{resource}/{id}");

        let response = put_json_auth(app.clone(), &uri, json!({ "name": "Launches" }), &token).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["description"], "Release week");

        let response = put_json_auth(app.clone(), &uri, json!({ "description": null }), &token).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["data"]["description"].is_null());
        assert_eq!(json["data"]["name"], "Launches");
    }
}

#[tokio::test]
async fn categories_are_private_to_their_owner() {
    let app = common::build_test_app();
    let (_, alice) = register_and_login(&app, "alice").await;
    let (_, bob) = register_and_login(&app, "bob").await;
    let category_id = create(&app, &alice, "categories", "Work").await;

    let response = delete_auth(app.clone(), &format!("/api/v1/categories/{category_id}"), &bob).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Bob cannot file his own layout under Alice's category.
    let response = post_json_auth(
        app.clone(),
        "/api/v1/layouts/generate",
        json!({ "title": "Mine", "description": "x", "category_id": category_id }),
        &bob,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, "/api/v1/categories", &bob).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_category_uncategorizes_layouts() {
    let app = common::build_test_app();
    let (_, token) = register_and_login(&app, "alice").await;
    let category_id = create(&app, &token, "categories", "Drafts").await;
    let layout_id = generate_layout(&app, &token, "Home").await["id"]
        .as_i64()
        .unwrap();

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/layouts/{layout_id}/category"),
        json!({ "category_id": category_id }),
        &token,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["category_id"], category_id);

    let response = get_auth(
        app.clone(),
        &format!("/api/v1/layouts/search?category_id={category_id}"),
        &token,
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = delete_auth(
        app.clone(),
        &format!("/api/v1/categories/{category_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app, &format!("/api/v1/layouts/{layout_id}"), &token).await;
    assert!(body_json(response).await["data"]["category_id"].is_null());
}

#[tokio::test]
async fn tag_attach_is_idempotent_and_detach_is_forgiving() {
    let app = common::build_test_app();
    let (_, token) = register_and_login(&app, "alice").await;
    let tag_id = create(&app, &token, "tags", "hero").await;
    let layout_id = generate_layout(&app, &token, "Splash").await["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/v1/layouts/{layout_id}/tags/{tag_id}");

    let response = post_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = post_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app, &format!("/api/v1/layouts/{layout_id}/tags"), &token).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn tag_delete_reports_outcome() {
    let app = common::build_test_app();
    let (_, token) = register_and_login(&app, "alice").await;
    let tag_id = create(&app, &token, "tags", "temp").await;
    let layout_id = generate_layout(&app, &token, "Promo").await["id"]
        .as_i64()
        .unwrap();
    post_auth(
        app.clone(),
        &format!("/api/v1/layouts/{layout_id}/tags/{tag_id}"),
        &token,
    )
    .await;

    let response = delete_auth(app.clone(), &format!("/api/v1/tags/{tag_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["outcome"], "deleted");
    assert_eq!(json["data"]["tag_id"], tag_id);

    let response = delete_auth(app.clone(), &format!("/api/v1/tags/{tag_id}"), &token).await;
    assert_eq!(body_json(response).await["data"]["outcome"], "already_deleted");

    let response = get_auth(app, &format!("/api/v1/layouts/{layout_id}/tags"), &token).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_tag_filter_all_and_any() {
    let app = common::build_test_app();
    let (_, token) = register_and_login(&app, "alice").await;
    let red = create(&app, &token, "tags", "red").await;
    let blue = create(&app, &token, "tags", "blue").await;
    let both = generate_layout(&app, &token, "Both").await["id"].as_i64().unwrap();
    let only_red = generate_layout(&app, &token, "Red only").await["id"]
        .as_i64()
        .unwrap();
    generate_layout(&app, &token, "Untagged").await;

    for (layout, tag) in [(both, red), (both, blue), (only_red, red)] {
        post_auth(
            app.clone(),
            &format!("/api/v1/layouts/{layout}/tags/{tag}"),
            &token,
        )
        .await;
    }

    let response = get_auth(
        app.clone(),
        &format!("/api/v1/layouts/search?tag_ids={red},{blue}"),
        &token,
    )
    .await;
    let json = body_json(response).await;
    let found: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    assert_eq!(found, vec![both]);

    let response = get_auth(
        app.clone(),
        &format!("/api/v1/layouts/search?tag_ids={red},{blue}&tag_match=any"),
        &token,
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let response = get_auth(app, "/api/v1/layouts/search?tag_ids=1,nope", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attaching_someone_elses_tag_is_forbidden() {
    let app = common::build_test_app();
    let (_, alice) = register_and_login(&app, "alice").await;
    let (_, bob) = register_and_login(&app, "bob").await;
    let bobs_tag = create(&app, &bob, "tags", "bob-only").await;
    let layout_id = generate_layout(&app, &alice, "Alice page").await["id"]
        .as_i64()
        .unwrap();

    let response = post_auth(
        app,
        &format!("/api/v1/layouts/{layout_id}/tags/{bobs_tag}"),
        &alice,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
