//! Single entry point for layout authorization.
//!
//! Handlers never compare owner ids or share rows themselves. They ask for a
//! minimum [`EffectiveRole`] here, which gathers the facts from the store and
//! applies the resolution order in `layoutsmith_core::access`.

use layoutsmith_core::access::{ensure_role, resolve_effective_role};
use layoutsmith_core::error::CoreError;
use layoutsmith_core::roles::EffectiveRole;
use layoutsmith_core::types::DbId;
use layoutsmith_db::models::layout::GeneratedLayout;
use layoutsmith_db::{LayoutStore, ShareStore, Store};

use crate::error::{AppError, AppResult};

fn layout_not_found(layout_id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "GeneratedLayout",
        id: layout_id,
    })
}

/// The caller's effective role on a layout, or `None` without access.
///
/// Fails with `NotFound` when the layout does not exist.
pub async fn resolve_role(
    store: &dyn Store,
    user_id: Option<DbId>,
    layout_id: DbId,
) -> AppResult<Option<EffectiveRole>> {
    let facts = store
        .access_facts(user_id, layout_id)
        .await?
        .ok_or_else(|| layout_not_found(layout_id))?;
    Ok(resolve_effective_role(&facts))
}

/// Require at least `required` on a layout and return the resolved role.
///
/// Anonymous callers without access get `Unauthorized` rather than
/// `Forbidden`, since signing in may change the outcome.
pub async fn require_role(
    store: &dyn Store,
    user_id: Option<DbId>,
    layout_id: DbId,
    required: EffectiveRole,
) -> AppResult<EffectiveRole> {
    let resolved = resolve_role(store, user_id, layout_id).await?;
    if user_id.is_none() && resolved.map_or(true, |r| r < required) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Sign in to access this layout".into(),
        )));
    }
    Ok(ensure_role(resolved, required, layout_id)?)
}

/// [`require_role`], then load the layout row.
pub async fn require_layout(
    store: &dyn Store,
    user_id: Option<DbId>,
    layout_id: DbId,
    required: EffectiveRole,
) -> AppResult<(GeneratedLayout, EffectiveRole)> {
    let role = require_role(store, user_id, layout_id, required).await?;
    let layout = store
        .find_layout(layout_id)
        .await?
        .ok_or_else(|| layout_not_found(layout_id))?;
    Ok((layout, role))
}
