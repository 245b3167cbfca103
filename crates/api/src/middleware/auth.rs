//! JWT-based authentication extractors for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(auth: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = auth.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.to_string()))
}

fn authenticate(header: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| unauthorized("Invalid or expired token"))?;

    Ok(AuthUser {
        user_id: claims.sub,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        authenticate(header, state)
    }
}

/// Caller identity for endpoints that also serve anonymous users.
///
/// A missing header yields `MaybeAuthUser(None)`; a present but invalid
/// token is still rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn user_id(&self) -> Option<DbId> {
        self.0.map(|u| u.user_id)
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts.headers.get(AUTHORIZATION) {
            None => Ok(MaybeAuthUser(None)),
            Some(value) => {
                let header = value
                    .to_str()
                    .map_err(|_| unauthorized("Malformed Authorization header"))?;
                Ok(MaybeAuthUser(Some(authenticate(header, state)?)))
            }
        }
    }
}
