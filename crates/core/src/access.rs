//! Effective-role resolution for a user against a layout.
//!
//! The storage layer gathers an [`AccessFacts`] snapshot (ownership, share
//! rows across the layout's chain, the user's standing in each sharing team)
//! and [`resolve_effective_role`] applies the priority order:
//!
//! 1. owner
//! 2. direct share
//! 3. team share, intersected with the user's team role
//! 4. public visibility (read-only)

use crate::error::CoreError;
use crate::roles::{EffectiveRole, SharePermission, TeamAuthority};
use crate::types::DbId;

/// A layout shared with a team the user belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamGrant {
    pub permission: SharePermission,
    pub authority: TeamAuthority,
}

impl TeamGrant {
    /// The more restrictive of the share permission and the team-role cap.
    pub fn effective(self) -> EffectiveRole {
        EffectiveRole::from(self.permission).min(self.authority.layout_cap())
    }
}

/// Everything needed to decide a user's role on one layout.
#[derive(Debug, Clone, Default)]
pub struct AccessFacts {
    pub is_owner: bool,
    pub is_public: bool,
    /// Permissions of every direct share to the user on the layout's chain.
    pub direct_shares: Vec<SharePermission>,
    pub team_grants: Vec<TeamGrant>,
}

/// Resolve the effective role, or `None` when the user has no access.
pub fn resolve_effective_role(facts: &AccessFacts) -> Option<EffectiveRole> {
    if facts.is_owner {
        return Some(EffectiveRole::Owner);
    }

    if let Some(direct) = facts.direct_shares.iter().copied().max() {
        return Some(direct.into());
    }

    if let Some(team) = facts.team_grants.iter().map(|g| g.effective()).max() {
        return Some(team);
    }

    facts.is_public.then_some(EffectiveRole::Viewer)
}

/// Check a resolved role against the minimum an operation needs.
pub fn ensure_role(
    resolved: Option<EffectiveRole>,
    required: EffectiveRole,
    layout_id: DbId,
) -> Result<EffectiveRole, CoreError> {
    match resolved {
        Some(role) if role >= required => Ok(role),
        Some(role) => Err(CoreError::Forbidden(format!(
            "Layout {layout_id} requires {required} access, you have {role}"
        ))),
        None => Err(CoreError::Forbidden(format!(
            "You do not have access to layout {layout_id}"
        ))),
    }
}
