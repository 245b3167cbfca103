//! Handlers for the `/auth` resource (register, login, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use layoutsmith_core::error::CoreError;
use layoutsmith_db::models::user::{CreateUser, UserResponse};
use layoutsmith_db::UserStore;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "must be 3 to 50 characters"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account. Duplicate usernames or emails yield 409.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = state
        .store
        .create_user(&CreateUser {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(user),
        }),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate with username and password. Returns a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = state
        .store
        .find_user_by_username(input.username.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        tracing::info!(user_id = user.id, "Rejected login with wrong password");
        return Err(invalid_credentials());
    }

    let access_token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(AuthResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt.expires_in_secs(),
        user: UserResponse::from(user),
    }))
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Account no longer exists".into())))?;

    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}
