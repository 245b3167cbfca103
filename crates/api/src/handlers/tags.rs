//! Handlers for the `/tags` resource.
//!
//! Attaching tags to layouts lives with the layout handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::organization::{
    normalize_color, normalize_name, validate_description, DeleteOutcome,
};
use layoutsmith_core::types::DbId;
use layoutsmith_db::models::tag::{CreateTag, Tag, TagDeleteResult, UpdateTag};
use layoutsmith_db::store::NewLabel;
use layoutsmith_db::TagStore;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn ensure_owner(tag: &Tag, user_id: DbId) -> AppResult<()> {
    if tag.owner_user_id != user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Tag belongs to another user".into(),
        )));
    }
    Ok(())
}

/// GET /api/v1/tags
pub async fn list_tags(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let tags = state.store.list_tags(auth.user_id).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// POST /api/v1/tags
pub async fn create_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTag>,
) -> AppResult<impl IntoResponse> {
    let name = normalize_name("Tag", &input.name)?;
    let color = normalize_color(input.color.as_deref())?;
    validate_description(input.description.as_deref())?;

    let tag = state
        .store
        .create_tag(&NewLabel {
            owner_user_id: auth.user_id,
            name,
            color,
            description: input.description,
        })
        .await?;

    tracing::info!(tag_id = tag.id, user_id = auth.user_id, "Tag created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: tag })))
}

/// PUT /api/v1/tags/{id}
pub async fn update_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(tag_id): Path<DbId>,
    Json(input): Json<UpdateTag>,
) -> AppResult<impl IntoResponse> {
    let update = UpdateTag {
        name: input
            .name
            .as_deref()
            .map(|n| normalize_name("Tag", n))
            .transpose()?,
        color: input
            .color
            .as_deref()
            .map(|c| normalize_color(Some(c)))
            .transpose()?,
        description: input.description,
    };
    validate_description(update.description.as_ref().and_then(Option::as_deref))?;

    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Tag",
            id: tag_id,
        })
    };
    let existing = state.store.find_tag(tag_id).await?.ok_or_else(not_found)?;
    ensure_owner(&existing, auth.user_id)?;

    let tag = state
        .store
        .update_tag(tag_id, &update)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(tag_id, user_id = auth.user_id, "Tag updated");
    Ok(Json(DataResponse { data: tag }))
}

/// DELETE /api/v1/tags/{id}
///
/// Removes the tag from every layout. Deleting a tag that no longer exists
/// reports `already_deleted` instead of failing.
pub async fn delete_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(tag_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TagDeleteResult>>> {
    let outcome = match state.store.find_tag(tag_id).await? {
        None => DeleteOutcome::AlreadyDeleted,
        Some(tag) => {
            ensure_owner(&tag, auth.user_id)?;
            if state.store.delete_tag(tag_id).await? {
                tracing::info!(tag_id, user_id = auth.user_id, "Tag deleted");
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::AlreadyDeleted
            }
        }
    };

    Ok(Json(DataResponse {
        data: TagDeleteResult { tag_id, outcome },
    }))
}
