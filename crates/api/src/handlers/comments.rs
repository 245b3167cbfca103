//! Handlers for layout comments.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::organization::validate_comment;
use layoutsmith_core::roles::EffectiveRole;
use layoutsmith_core::types::DbId;
use layoutsmith_db::models::comment::{CreateComment, NewComment};
use layoutsmith_db::CommentStore;

use crate::access::require_role;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/layouts/{id}/comments
pub async fn list_comments(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(
        state.store.as_ref(),
        caller.user_id(),
        layout_id,
        EffectiveRole::Viewer,
    )
    .await?;
    let comments = state.store.list_comments(layout_id).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /api/v1/layouts/{id}/comments
///
/// Anyone who can read the layout may comment on it.
pub async fn add_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
    Json(input): Json<CreateComment>,
) -> AppResult<impl IntoResponse> {
    validate_comment(&input.comment)?;
    require_role(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Viewer,
    )
    .await?;

    let comment = state
        .store
        .add_comment(&NewComment {
            layout_id,
            user_id: auth.user_id,
            comment: input.comment.trim().to_string(),
            position_x: input.position_x,
            position_y: input.position_y,
        })
        .await?;

    tracing::info!(comment_id = comment.id, layout_id, user_id = auth.user_id, "Comment added");
    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// POST /api/v1/comments/{id}/resolve
///
/// The comment's author or an editor of the layout may resolve it.
/// Resolution cannot be undone, and resolving twice is harmless.
pub async fn resolve_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "LayoutComment",
            id: comment_id,
        })
    };
    let comment = state
        .store
        .find_comment(comment_id)
        .await?
        .ok_or_else(not_found)?;

    if comment.user_id != auth.user_id {
        require_role(
            state.store.as_ref(),
            Some(auth.user_id),
            comment.layout_id,
            EffectiveRole::Editor,
        )
        .await?;
    }

    let resolved = state
        .store
        .resolve_comment(comment_id)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(comment_id, user_id = auth.user_id, "Comment resolved");
    Ok(Json(DataResponse { data: resolved }))
}
