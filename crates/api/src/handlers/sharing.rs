//! Handlers for layout shares and the caller's shared-with-me listing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::roles::EffectiveRole;
use layoutsmith_core::types::DbId;
use layoutsmith_db::models::share::{CreateShare, NewShare, ShareTarget, SharedWithMe};
use layoutsmith_db::{ShareStore, TeamStore, UserStore};

use crate::access::{require_layout, require_role, resolve_role};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/layouts/{id}/shares
///
/// Share with exactly one user or team. Sharing again with the same target
/// replaces the permission.
pub async fn create_share(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
    Json(input): Json<CreateShare>,
) -> AppResult<impl IntoResponse> {
    let target = input.target()?;
    let (layout, _) = require_layout(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Admin,
    )
    .await?;

    match target {
        ShareTarget::User(user_id) => {
            if user_id == layout.owner_user_id {
                return Err(AppError::Core(CoreError::Validation(
                    "A layout cannot be shared with its owner".into(),
                )));
            }
            if state.store.find_user(user_id).await?.is_none() {
                return Err(AppError::Core(CoreError::NotFound {
                    entity: "User",
                    id: user_id,
                }));
            }
        }
        ShareTarget::Team(team_id) => {
            if state.store.find_team(team_id).await?.is_none() {
                return Err(AppError::Core(CoreError::NotFound {
                    entity: "Team",
                    id: team_id,
                }));
            }
        }
    }

    let share = state
        .store
        .upsert_share(&NewShare {
            layout_id,
            shared_by_user_id: auth.user_id,
            target,
            permissions: input.permissions,
        })
        .await?;

    tracing::info!(
        share_id = share.id,
        layout_id,
        target = ?target,
        permissions = %share.permissions,
        "Layout shared",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: share })))
}

/// GET /api/v1/layouts/{id}/shares
pub async fn list_shares(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Admin,
    )
    .await?;
    let shares = state.store.list_shares(layout_id).await?;
    Ok(Json(DataResponse { data: shares }))
}

/// DELETE /api/v1/layouts/{id}/shares/{share_id}
pub async fn delete_share(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((layout_id, share_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    require_role(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Admin,
    )
    .await?;

    let belongs = state
        .store
        .find_share(share_id)
        .await?
        .is_some_and(|s| s.layout_id == layout_id);
    if !belongs {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "SharedLayout",
            id: share_id,
        }));
    }

    state.store.delete_share(share_id).await?;
    tracing::info!(share_id, layout_id, user_id = auth.user_id, "Share revoked");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/shared-with-me
///
/// Layouts reachable through a direct or team share, each with the role the
/// caller holds on it.
pub async fn shared_with_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SharedWithMe>>>> {
    let layouts = state.store.shared_with_user(auth.user_id).await?;

    let mut shared = Vec::with_capacity(layouts.len());
    for layout in layouts {
        if let Some(role) = resolve_role(state.store.as_ref(), Some(auth.user_id), layout.id).await? {
            shared.push(SharedWithMe { layout, role });
        }
    }

    Ok(Json(DataResponse { data: shared }))
}
