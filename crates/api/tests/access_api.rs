//! HTTP-level tests for sharing, role resolution and comments.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, generate_layout, get, get_auth, improve_layout, post_auth,
    post_json_auth, register_and_login,
};
use serde_json::json;

async fn share(
    app: &axum::Router,
    token: &str,
    layout_id: i64,
    body: serde_json::Value,
) -> axum::response::Response {
    post_json_auth(
        app.clone(),
        &format!("/api/v1/layouts/{layout_id}/shares"),
        body,
        token,
    )
    .await
}

async fn role_of(app: &axum::Router, token: &str, layout_id: i64) -> serde_json::Value {
    let response = get_auth(app.clone(), &format!("/api/v1/layouts/{layout_id}"), token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["role"].clone()
}

/// Team owned by `owner_token` with `member_id` added under `role`.
async fn team_with_member(
    app: &axum::Router,
    owner_token: &str,
    member_id: i64,
    role: &str,
) -> i64 {
    let response = post_json_auth(
        app.clone(),
        "/api/v1/teams",
        json!({ "name": format!("team-{role}") }),
        owner_token,
    )
    .await;
    let team_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/teams/{team_id}/members"),
        json!({ "user_id": member_id, "role": role }),
        owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    team_id
}

#[tokio::test]
async fn direct_share_outranks_team_share() {
    let app = common::build_test_app();
    let (_, alice) = register_and_login(&app, "alice").await;
    let (bob_id, bob) = register_and_login(&app, "bob").await;
    let layout_id = generate_layout(&app, &alice, "Dashboard").await["id"]
        .as_i64()
        .unwrap();
    let team_id = team_with_member(&app, &alice, bob_id, "viewer").await;

    share(&app, &alice, layout_id, json!({ "team_id": team_id, "permissions": "viewer" })).await;
    assert_eq!(role_of(&app, &bob, layout_id).await, "viewer");

    share(&app, &alice, layout_id, json!({ "user_id": bob_id, "permissions": "editor" })).await;
    assert_eq!(role_of(&app, &bob, layout_id).await, "editor");

    // Editor, not admin: sharing stays out of reach.
    let response = get_auth(app, &format!("/api/v1/layouts/{layout_id}/shares"), &bob).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn team_role_caps_team_share() {
    let app = common::build_test_app();
    let (_, alice) = register_and_login(&app, "alice").await;
    let (bob_id, bob) = register_and_login(&app, "bob").await;
    let layout_id = generate_layout(&app, &alice, "Wiki").await["id"]
        .as_i64()
        .unwrap();
    let team_id = team_with_member(&app, &alice, bob_id, "member").await;

    share(&app, &alice, layout_id, json!({ "team_id": team_id, "permissions": "admin" })).await;
    assert_eq!(role_of(&app, &bob, layout_id).await, "viewer");

    let response = post_json_auth(
        app,
        &format!("/api/v1/layouts/{layout_id}/improve"),
        json!({ "feedback": "more color" }),
        &bob,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn share_on_root_covers_later_versions() {
    let app = common::build_test_app();
    let (alice_id, alice) = register_and_login(&app, "alice").await;
    let (bob_id, bob) = register_and_login(&app, "bob").await;
    let root_id = generate_layout(&app, &alice, "Portal").await["id"]
        .as_i64()
        .unwrap();

    let response = share(&app, &alice, root_id, json!({ "user_id": bob_id, "permissions": "editor" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Bob improves; the version still belongs to Alice.
    let version = improve_layout(&app, &bob, root_id, "tighter grid").await;
    let version_id = version["id"].as_i64().unwrap();
    let response = get_auth(app.clone(), &format!("/api/v1/layouts/{version_id}"), &bob).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["owner_user_id"], alice_id);
    assert_eq!(json["data"]["role"], "editor");

    // Editors cannot change visibility while improving.
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/layouts/{root_id}/improve"),
        json!({ "feedback": "go public", "is_public": true }),
        &bob,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, "/api/v1/layouts/search?scope=accessible", &bob).await;
    let found = body_json(response).await["data"].as_array().unwrap().len();
    assert_eq!(found, 2);
}

#[tokio::test]
async fn shared_with_me_includes_versions_of_shared_root() {
    let app = common::build_test_app();
    let (_, alice) = register_and_login(&app, "alice").await;
    let (bob_id, bob) = register_and_login(&app, "bob").await;
    let root_id = generate_layout(&app, &alice, "Docs").await["id"]
        .as_i64()
        .unwrap();
    share(&app, &alice, root_id, json!({ "user_id": bob_id, "permissions": "viewer" })).await;
    let version_id = improve_layout(&app, &alice, root_id, "add sidebar").await["id"]
        .as_i64()
        .unwrap();

    let ids = |json: serde_json::Value| -> Vec<i64> {
        json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["id"].as_i64().unwrap())
            .collect()
    };

    let response = get_auth(app.clone(), "/api/v1/shared-with-me", &bob).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["role"], "viewer");
    assert_eq!(json["data"][1]["role"], "viewer");
    let shared = ids(json);
    assert_eq!(shared, vec![version_id, root_id]);

    let response = get_auth(app, "/api/v1/layouts/search?scope=accessible", &bob).await;
    assert_eq!(ids(body_json(response).await), shared);
}

#[tokio::test]
async fn share_validation() {
    let app = common::build_test_app();
    let (alice_id, alice) = register_and_login(&app, "alice").await;
    let (bob_id, bob) = register_and_login(&app, "bob").await;
    let layout_id = generate_layout(&app, &alice, "Forms").await["id"]
        .as_i64()
        .unwrap();

    let both = share(&app, &alice, layout_id, json!({ "user_id": bob_id, "team_id": 1, "permissions": "viewer" })).await;
    assert_eq!(both.status(), StatusCode::BAD_REQUEST);

    let neither = share(&app, &alice, layout_id, json!({ "permissions": "viewer" })).await;
    assert_eq!(neither.status(), StatusCode::BAD_REQUEST);

    let owner = share(&app, &alice, layout_id, json!({ "user_id": alice_id, "permissions": "viewer" })).await;
    assert_eq!(owner.status(), StatusCode::BAD_REQUEST);

    let ghost = share(&app, &alice, layout_id, json!({ "team_id": 777, "permissions": "viewer" })).await;
    assert_eq!(ghost.status(), StatusCode::NOT_FOUND);

    let stranger = share(&app, &bob, layout_id, json!({ "user_id": bob_id, "permissions": "admin" })).await;
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn resharing_updates_and_revoking_removes_access() {
    let app = common::build_test_app();
    let (_, alice) = register_and_login(&app, "alice").await;
    let (bob_id, bob) = register_and_login(&app, "bob").await;
    let layout_id = generate_layout(&app, &alice, "Careers").await["id"]
        .as_i64()
        .unwrap();

    share(&app, &alice, layout_id, json!({ "user_id": bob_id, "permissions": "viewer" })).await;
    let response = share(&app, &alice, layout_id, json!({ "user_id": bob_id, "permissions": "admin" })).await;
    let share_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = get_auth(app.clone(), &format!("/api/v1/layouts/{layout_id}/shares"), &bob).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["permissions"], "admin");

    let response = get_auth(app.clone(), "/api/v1/shared-with-me", &bob).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], layout_id);
    assert_eq!(json["data"][0]["role"], "admin");

    let response = delete_auth(
        app.clone(),
        &format!("/api/v1/layouts/{layout_id}/shares/{share_id}"),
        &alice,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app.clone(), &format!("/api/v1/layouts/{layout_id}"), &bob).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, "/api/v1/shared-with-me", &bob).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn comments_follow_read_access() {
    let app = common::build_test_app();
    let (_, alice) = register_and_login(&app, "alice").await;
    let (bob_id, bob) = register_and_login(&app, "bob").await;
    let (_, carol) = register_and_login(&app, "carol").await;
    let layout_id = generate_layout(&app, &alice, "Landing").await["id"]
        .as_i64()
        .unwrap();
    let comments = format!("/api/v1/layouts/{layout_id}/comments");

    let response = post_json_auth(app.clone(), &comments, json!({ "comment": "hi" }), &bob).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    share(&app, &alice, layout_id, json!({ "user_id": bob_id, "permissions": "viewer" })).await;

    let response = post_json_auth(
        app.clone(),
        &comments,
        json!({ "comment": "Logo is blurry", "position_x": 10.5, "position_y": 42.0 }),
        &bob,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let comment = body_json(response).await["data"].clone();
    assert_eq!(comment["resolved"], false);
    let comment_id = comment["id"].as_i64().unwrap();

    let response = post_json_auth(app.clone(), &comments, json!({ "comment": "   " }), &bob).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let resolve = format!("/api/v1/comments/{comment_id}/resolve");
    let response = post_auth(app.clone(), &resolve, &carol).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_auth(app.clone(), &resolve, &alice).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["resolved"], true);

    // Resolving again is harmless.
    let response = post_auth(app.clone(), &resolve, &bob).await;
    assert_eq!(body_json(response).await["data"]["resolved"], true);

    let response = get_auth(app.clone(), &comments, &bob).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = get(app, &comments).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
