//! Layout share model and DTOs.

use layoutsmith_core::error::CoreError;
use layoutsmith_core::roles::{EffectiveRole, SharePermission};
use layoutsmith_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::layout::LayoutSummary;

/// A row from the `shared_layouts` table. Exactly one of
/// `shared_with_user_id` / `shared_with_team_id` is set.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SharedLayout {
    pub id: DbId,
    pub layout_id: DbId,
    pub shared_by_user_id: DbId,
    pub shared_with_user_id: Option<DbId>,
    pub shared_with_team_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub permissions: SharePermission,
    pub shared_at: Timestamp,
}

impl SharedLayout {
    pub fn target(&self) -> Option<ShareTarget> {
        match (self.shared_with_user_id, self.shared_with_team_id) {
            (Some(user_id), None) => Some(ShareTarget::User(user_id)),
            (None, Some(team_id)) => Some(ShareTarget::Team(team_id)),
            _ => None,
        }
    }
}

/// Who a layout is shared with: an individual or a team, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTarget {
    User(DbId),
    Team(DbId),
}

impl ShareTarget {
    pub fn user_id(self) -> Option<DbId> {
        match self {
            ShareTarget::User(id) => Some(id),
            ShareTarget::Team(_) => None,
        }
    }

    pub fn team_id(self) -> Option<DbId> {
        match self {
            ShareTarget::Team(id) => Some(id),
            ShareTarget::User(_) => None,
        }
    }
}

/// Request body for `POST /layouts/{id}/shares`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShare {
    pub user_id: Option<DbId>,
    pub team_id: Option<DbId>,
    pub permissions: SharePermission,
}

impl CreateShare {
    /// Resolve the request into exactly one target.
    pub fn target(&self) -> Result<ShareTarget, CoreError> {
        match (self.user_id, self.team_id) {
            (Some(user_id), None) => Ok(ShareTarget::User(user_id)),
            (None, Some(team_id)) => Ok(ShareTarget::Team(team_id)),
            (Some(_), Some(_)) => Err(CoreError::Validation(
                "Share with either user_id or team_id, not both".to_string(),
            )),
            (None, None) => Err(CoreError::Validation(
                "Either user_id or team_id is required".to_string(),
            )),
        }
    }
}

/// Insert-or-update payload for a share.
#[derive(Debug, Clone)]
pub struct NewShare {
    pub layout_id: DbId,
    pub shared_by_user_id: DbId,
    pub target: ShareTarget,
    pub permissions: SharePermission,
}

/// A layout reachable through a share, with the caller's resolved role.
#[derive(Debug, Clone, Serialize)]
pub struct SharedWithMe {
    #[serde(flatten)]
    pub layout: LayoutSummary,
    pub role: EffectiveRole,
}
