#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use layoutsmith_api::auth::jwt::JwtConfig;
use layoutsmith_api::config::{GeneratorConfig, ServerConfig, StorageBackend};
use layoutsmith_api::generator::LayoutGenerator;
use layoutsmith_api::router::build_app_router;
use layoutsmith_api::state::AppState;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::generation::GenerationAction;
use layoutsmith_db::MemoryStore;
use tower::ServiceExt;

/// Build a test `ServerConfig` running on the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        storage: StorageBackend::Memory,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
        generator: GeneratorConfig {
            api_url: None,
            api_key: None,
            model: "test-model".to_string(),
            timeout_secs: 5,
        },
    }
}

/// Generator returning fixed, well-formed responses for each action.
pub struct ScriptedGenerator;

#[async_trait]
impl LayoutGenerator for ScriptedGenerator {
    async fn complete(&self, action: &GenerationAction) -> Result<String, CoreError> {
        let reply = match action {
            GenerationAction::Generate { description, .. } => serde_json::json!({
                "html": format!("<html><body><h1>{description}</h1></body></html>"),
                "title": "Model title",
                "description": format!("Generated: {description}"),
            }),
            GenerationAction::Improve { feedback, .. } => serde_json::json!({
                "html": format!("<html><body><p>{feedback}</p></body></html>"),
            }),
            GenerationAction::Recommend { .. } => serde_json::json!({
                "recommendations": ["Increase contrast", "Add a footer"],
            }),
        };
        Ok(reply.to_string())
    }
}

/// Generator that is always unavailable.
pub struct DownGenerator;

#[async_trait]
impl LayoutGenerator for DownGenerator {
    async fn complete(&self, _action: &GenerationAction) -> Result<String, CoreError> {
        Err(CoreError::DependencyFailure("connection refused".into()))
    }
}

/// Full application router on a fresh in-memory store with the scripted
/// generator.
pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(ScriptedGenerator))
}

pub fn build_test_app_with(generator: Arc<dyn LayoutGenerator>) -> Router {
    let config = test_config();
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        config: Arc::new(config.clone()),
        generator,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Register `username` and log in. Returns `(user_id, access_token)`.
pub async fn register_and_login(app: &Router, username: &str) -> (i64, String) {
    let password = "correct-horse-battery";
    let response = post_json(
        app.clone(),
        "/api/v1/auth/register",
        serde_json::json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": password,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/login",
        serde_json::json!({ "username": username, "password": password }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let user_id = json["user"]["id"].as_i64().unwrap();
    let token = json["access_token"].as_str().unwrap().to_string();
    (user_id, token)
}

/// Generate a root layout titled `title`. Returns its JSON `data`.
pub async fn generate_layout(app: &Router, token: &str, title: &str) -> serde_json::Value {
    let response = post_json_auth(
        app.clone(),
        "/api/v1/layouts/generate",
        serde_json::json!({
            "title": title,
            "description": format!("{title} page"),
        }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Improve layout `id` with `feedback`. Returns the new version's JSON `data`.
pub async fn improve_layout(
    app: &Router,
    token: &str,
    id: i64,
    feedback: &str,
) -> serde_json::Value {
    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/layouts/{id}/improve"),
        serde_json::json!({ "feedback": feedback }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}
