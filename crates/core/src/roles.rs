//! Permission levels for layouts and roles within teams.
//!
//! All three enums are persisted as lowercase text. Variants are declared in
//! ascending order of privilege so the derived `Ord` matches the hierarchy.

define_text_enum! {
    /// Effective access level a user holds on a layout.
    ///
    /// `Owner` is a strict superset of `Admin`; it is never stored, only
    /// derived from `owner_user_id`.
    EffectiveRole ("effective role") {
        Viewer = "viewer",
        Editor = "editor",
        Admin = "admin",
        Owner = "owner",
    }
}

define_text_enum! {
    /// Permission granted by a share row.
    SharePermission ("share permission") {
        Viewer = "viewer",
        Editor = "editor",
        Admin = "admin",
    }
}

define_text_enum! {
    /// Role of a member inside a team. `Admin > Editor > Viewer > Member`.
    TeamRole ("team role") {
        Member = "member",
        Viewer = "viewer",
        Editor = "editor",
        Admin = "admin",
    }
}

impl From<SharePermission> for EffectiveRole {
    fn from(value: SharePermission) -> Self {
        match value {
            SharePermission::Viewer => EffectiveRole::Viewer,
            SharePermission::Editor => EffectiveRole::Editor,
            SharePermission::Admin => EffectiveRole::Admin,
        }
    }
}

impl TeamRole {
    /// Highest layout permission a member with this role can exercise through
    /// a team share. `member` is read-oriented, like `viewer`.
    pub fn layout_cap(self) -> EffectiveRole {
        match self {
            TeamRole::Admin => EffectiveRole::Admin,
            TeamRole::Editor => EffectiveRole::Editor,
            TeamRole::Viewer | TeamRole::Member => EffectiveRole::Viewer,
        }
    }

    /// Share permission implied by this role, used when an accepted
    /// invitation grants access to its bound layout.
    pub fn share_permission(self) -> SharePermission {
        match self {
            TeamRole::Admin => SharePermission::Admin,
            TeamRole::Editor => SharePermission::Editor,
            TeamRole::Viewer | TeamRole::Member => SharePermission::Viewer,
        }
    }
}

/// How a user relates to a team.
///
/// The creator holds the highest authority without a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamAuthority {
    Creator,
    Member(TeamRole),
}

impl TeamAuthority {
    /// Creators and admins may invite, add and remove members and manage
    /// team-level shares.
    pub fn can_manage_members(self) -> bool {
        matches!(
            self,
            TeamAuthority::Creator | TeamAuthority::Member(TeamRole::Admin)
        )
    }

    /// Layout permission ceiling imposed by the user's standing in the team.
    pub fn layout_cap(self) -> EffectiveRole {
        match self {
            TeamAuthority::Creator => EffectiveRole::Admin,
            TeamAuthority::Member(role) => role.layout_cap(),
        }
    }
}
