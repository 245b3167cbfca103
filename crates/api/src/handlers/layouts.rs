//! Handlers for the `/layouts` resource: reads, draft edits, visibility,
//! category assignment, version history and layout tags.
//!
//! Every endpoint authorizes through [`crate::access`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::generation::MAX_CODE_LENGTH;
use layoutsmith_core::roles::EffectiveRole;
use layoutsmith_core::types::DbId;
use layoutsmith_db::models::layout::{
    GeneratedLayout, UpdateLayoutCategory, UpdateLayoutCode, UpdateVisibility,
};
use layoutsmith_db::models::tag::Tag;
use layoutsmith_db::{LayoutStore, TagStore};
use serde::Serialize;

use crate::access::{require_layout, require_role};
use crate::error::{AppError, AppResult};
use crate::handlers::categories::ensure_category_usable;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

/// A layout with its tags and the caller's resolved role.
#[derive(Debug, Serialize)]
pub struct LayoutDetail {
    #[serde(flatten)]
    pub layout: GeneratedLayout,
    pub tags: Vec<Tag>,
    pub role: EffectiveRole,
}

fn layout_gone(layout_id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "GeneratedLayout",
        id: layout_id,
    })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/layouts
///
/// The caller's own layouts, newest first.
pub async fn list_layouts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let layouts = state.store.list_owned_layouts(auth.user_id).await?;
    Ok(Json(DataResponse { data: layouts }))
}

/// GET /api/v1/layouts/{id}
///
/// Public layouts are readable without a token.
pub async fn get_layout(
    caller: MaybeAuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (layout, role) = require_layout(
        state.store.as_ref(),
        caller.user_id(),
        layout_id,
        EffectiveRole::Viewer,
    )
    .await?;
    let tags = state.store.layout_tags(layout_id).await?;

    Ok(Json(DataResponse {
        data: LayoutDetail { layout, tags, role },
    }))
}

/// GET /api/v1/layouts/{id}/versions
///
/// Every node of the layout's version chain, newest first. The result is
/// the same whichever node of the chain is requested.
pub async fn version_history(
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
    let history = state.store.version_history(layout_id).await?;
    Ok(Json(DataResponse { data: history }))
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// PUT /api/v1/layouts/{id}/code
///
/// Hand edit of the code body. A draft change, not a new version.
pub async fn update_code(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
    Json(input): Json<UpdateLayoutCode>,
) -> AppResult<impl IntoResponse> {
    if input.generated_code.len() > MAX_CODE_LENGTH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "generated_code must not exceed {MAX_CODE_LENGTH} bytes"
        ))));
    }
    require_role(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Editor,
    )
    .await?;

    let layout = state
        .store
        .update_code(layout_id, &input.generated_code)
        .await?
        .ok_or_else(|| layout_gone(layout_id))?;

    tracing::info!(layout_id, user_id = auth.user_id, "Layout code edited");
    Ok(Json(DataResponse { data: layout }))
}

/// PUT /api/v1/layouts/{id}/visibility
///
/// Owner only. Admin share holders may not change visibility.
pub async fn update_visibility(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
    Json(input): Json<UpdateVisibility>,
) -> AppResult<impl IntoResponse> {
    require_role(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Owner,
    )
    .await?;

    let layout = state
        .store
        .set_visibility(layout_id, input.is_public)
        .await?
        .ok_or_else(|| layout_gone(layout_id))?;

    tracing::info!(
        layout_id,
        user_id = auth.user_id,
        is_public = input.is_public,
        "Layout visibility changed",
    );
    Ok(Json(DataResponse { data: layout }))
}

/// PUT /api/v1/layouts/{id}/category
///
/// Editors may file a layout under one of the layout owner's categories,
/// or clear it with `null`.
pub async fn update_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
    Json(input): Json<UpdateLayoutCategory>,
) -> AppResult<impl IntoResponse> {
    let (current, _) = require_layout(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Editor,
    )
    .await?;

    if let Some(category_id) = input.category_id {
        ensure_category_usable(state.store.as_ref(), category_id, current.owner_user_id).await?;
    }

    let layout = state
        .store
        .set_category(layout_id, input.category_id)
        .await?
        .ok_or_else(|| layout_gone(layout_id))?;

    tracing::info!(
        layout_id,
        user_id = auth.user_id,
        category_id = ?input.category_id,
        "Layout category changed",
    );
    Ok(Json(DataResponse { data: layout }))
}

// ---------------------------------------------------------------------------
// Layout tags
// ---------------------------------------------------------------------------

/// GET /api/v1/layouts/{id}/tags
pub async fn list_layout_tags(
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
    let tags = state.store.layout_tags(layout_id).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// POST /api/v1/layouts/{id}/tags/{tag_id}
///
/// Idempotent: 201 when the tag is newly attached, 200 when it already was.
/// Responds with the layout's full tag list.
pub async fn attach_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((layout_id, tag_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    require_role(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Editor,
    )
    .await?;

    let tag = state.store.find_tag(tag_id).await?.ok_or(AppError::Core(
        CoreError::NotFound {
            entity: "Tag",
            id: tag_id,
        },
    ))?;
    if tag.owner_user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only attach your own tags".into(),
        )));
    }

    let created = state.store.attach_tag(layout_id, tag_id).await?;
    if created {
        tracing::info!(layout_id, tag_id, user_id = auth.user_id, "Tag attached");
    }

    let tags = state.store.layout_tags(layout_id).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: tags })))
}

/// DELETE /api/v1/layouts/{id}/tags/{tag_id}
///
/// Detaching a tag that is not attached also succeeds.
pub async fn detach_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((layout_id, tag_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    require_role(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Editor,
    )
    .await?;

    if state.store.detach_tag(layout_id, tag_id).await? {
        tracing::info!(layout_id, tag_id, user_id = auth.user_id, "Tag detached");
    } else {
        tracing::debug!(layout_id, tag_id, "Tag was not attached");
    }

    Ok(StatusCode::NO_CONTENT)
}
