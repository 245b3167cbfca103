//! Storage capability set.
//!
//! Each trait covers one aggregate. [`Store`] is their union and is
//! implemented for any type providing all of them, so handlers depend on
//! `Arc<dyn Store>` without knowing which backend is active.

use async_trait::async_trait;
use layoutsmith_core::access::AccessFacts;
use layoutsmith_core::roles::{TeamAuthority, TeamRole};
use layoutsmith_core::search::LayoutSearch;
use layoutsmith_core::types::DbId;

use crate::error::StoreError;
use crate::models::category::{Category, UpdateCategory};
use crate::models::comment::{LayoutComment, NewComment};
use crate::models::layout::{GeneratedLayout, LayoutSummary, NewLayoutVersion, NewRootLayout};
use crate::models::share::{NewShare, SharedLayout};
use crate::models::tag::{Tag, UpdateTag};
use crate::models::team::{NewInvitation, Team, TeamInvitation, TeamMember};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

/// Validated fields for inserting a category or tag.
#[derive(Debug, Clone)]
pub struct NewLabel {
    pub owner_user_id: DbId,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Duplicate username or email yields `Duplicate`.
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError>;

    async fn find_user(&self, id: DbId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create_category(&self, input: &NewLabel) -> Result<Category, StoreError>;

    async fn find_category(&self, id: DbId) -> Result<Option<Category>, StoreError>;

    /// Categories owned by `owner_user_id`, ordered by name.
    async fn list_categories(&self, owner_user_id: DbId) -> Result<Vec<Category>, StoreError>;

    /// Apply the non-`None` fields. Returns `None` if the category is gone.
    async fn update_category(
        &self,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, StoreError>;

    /// Delete a category, clearing `category_id` on its layouts.
    /// Returns `false` if it did not exist.
    async fn delete_category(&self, id: DbId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    async fn create_tag(&self, input: &NewLabel) -> Result<Tag, StoreError>;

    async fn find_tag(&self, id: DbId) -> Result<Option<Tag>, StoreError>;

    /// Tags owned by `owner_user_id`, ordered by name.
    async fn list_tags(&self, owner_user_id: DbId) -> Result<Vec<Tag>, StoreError>;

    async fn update_tag(&self, id: DbId, input: &UpdateTag) -> Result<Option<Tag>, StoreError>;

    /// Delete a tag and all of its layout associations.
    /// Returns `false` if it did not exist.
    async fn delete_tag(&self, id: DbId) -> Result<bool, StoreError>;

    /// Attach a tag to a layout. Returns `true` only when a new association
    /// was created.
    async fn attach_tag(&self, layout_id: DbId, tag_id: DbId) -> Result<bool, StoreError>;

    /// Detach a tag. Returns `false` when it was not attached.
    async fn detach_tag(&self, layout_id: DbId, tag_id: DbId) -> Result<bool, StoreError>;

    async fn layout_tags(&self, layout_id: DbId) -> Result<Vec<Tag>, StoreError>;
}

#[async_trait]
pub trait LayoutStore: Send + Sync {
    /// Insert a root layout labelled `v1.0`. A root with the same title for
    /// the same owner yields `Duplicate`.
    async fn create_root(&self, input: &NewRootLayout) -> Result<GeneratedLayout, StoreError>;

    /// Append a version to the chain containing `parent_layout_id`.
    ///
    /// The label is assigned while the chain root is locked, so concurrent
    /// calls never receive the same label.
    async fn create_version(&self, input: &NewLayoutVersion)
        -> Result<GeneratedLayout, StoreError>;

    async fn find_layout(&self, id: DbId) -> Result<Option<GeneratedLayout>, StoreError>;

    async fn root_title_exists(&self, owner_user_id: DbId, title: &str)
        -> Result<bool, StoreError>;

    /// Layouts owned by `owner_user_id`, newest first.
    async fn list_owned_layouts(&self, owner_user_id: DbId)
        -> Result<Vec<LayoutSummary>, StoreError>;

    /// Every node in the chain containing `layout_id`, newest first.
    async fn version_history(&self, layout_id: DbId) -> Result<Vec<LayoutSummary>, StoreError>;

    async fn update_code(
        &self,
        id: DbId,
        generated_code: &str,
    ) -> Result<Option<GeneratedLayout>, StoreError>;

    async fn set_visibility(
        &self,
        id: DbId,
        is_public: bool,
    ) -> Result<Option<GeneratedLayout>, StoreError>;

    async fn set_category(
        &self,
        id: DbId,
        category_id: Option<DbId>,
    ) -> Result<Option<GeneratedLayout>, StoreError>;

    /// Apply a validated search, newest first.
    async fn search_layouts(&self, search: &LayoutSearch)
        -> Result<Vec<LayoutSummary>, StoreError>;
}

#[async_trait]
pub trait TeamStore: Send + Sync {
    async fn create_team(
        &self,
        creator_id: DbId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Team, StoreError>;

    async fn find_team(&self, id: DbId) -> Result<Option<Team>, StoreError>;

    /// Teams the user created or belongs to, newest first.
    async fn list_teams_for_user(&self, user_id: DbId) -> Result<Vec<Team>, StoreError>;

    async fn delete_team(&self, id: DbId) -> Result<bool, StoreError>;

    /// The user's standing in a team, or `None` if unrelated.
    async fn team_authority(
        &self,
        team_id: DbId,
        user_id: DbId,
    ) -> Result<Option<TeamAuthority>, StoreError>;

    async fn list_members(&self, team_id: DbId) -> Result<Vec<TeamMember>, StoreError>;

    /// Add a member or change an existing member's role.
    async fn upsert_member(
        &self,
        team_id: DbId,
        user_id: DbId,
        role: TeamRole,
    ) -> Result<TeamMember, StoreError>;

    async fn remove_member(&self, team_id: DbId, user_id: DbId) -> Result<bool, StoreError>;

    /// Insert a pending invitation. A second pending invitation for the same
    /// (team, invitee) yields `Duplicate`.
    async fn create_invitation(&self, input: &NewInvitation)
        -> Result<TeamInvitation, StoreError>;

    async fn find_invitation(&self, id: DbId) -> Result<Option<TeamInvitation>, StoreError>;

    /// Pending invitations addressed to `user_id`, newest first.
    async fn pending_invitations(&self, user_id: DbId)
        -> Result<Vec<TeamInvitation>, StoreError>;

    /// Move a pending invitation to its terminal state in one transaction.
    ///
    /// On acceptance the invitee becomes a member with the invitation role,
    /// and if the invitation names a layout the invitee also receives a
    /// direct share on it unless one already exists. Responding twice or by
    /// anyone but the invitee yields `Rule`.
    async fn respond_invitation(
        &self,
        id: DbId,
        responder_id: DbId,
        accept: bool,
    ) -> Result<TeamInvitation, StoreError>;
}

#[async_trait]
pub trait ShareStore: Send + Sync {
    /// Insert a share, or update the permission if the layout is already
    /// shared with the same target.
    async fn upsert_share(&self, input: &NewShare) -> Result<SharedLayout, StoreError>;

    async fn find_share(&self, id: DbId) -> Result<Option<SharedLayout>, StoreError>;

    async fn list_shares(&self, layout_id: DbId) -> Result<Vec<SharedLayout>, StoreError>;

    async fn delete_share(&self, id: DbId) -> Result<bool, StoreError>;

    /// Layouts shared with the user directly or through a team, excluding
    /// the user's own, newest first.
    async fn shared_with_user(&self, user_id: DbId) -> Result<Vec<LayoutSummary>, StoreError>;

    /// Gather what the access resolver needs for `user_id` on `layout_id`.
    ///
    /// Shares on every ancestor of the layout are included. Returns `None`
    /// when the layout does not exist.
    async fn access_facts(
        &self,
        user_id: Option<DbId>,
        layout_id: DbId,
    ) -> Result<Option<AccessFacts>, StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn add_comment(&self, input: &NewComment) -> Result<LayoutComment, StoreError>;

    async fn find_comment(&self, id: DbId) -> Result<Option<LayoutComment>, StoreError>;

    /// Comments on a layout, oldest first.
    async fn list_comments(&self, layout_id: DbId) -> Result<Vec<LayoutComment>, StoreError>;

    /// Set `resolved`. Resolving an already resolved comment is a no-op.
    async fn resolve_comment(&self, id: DbId) -> Result<Option<LayoutComment>, StoreError>;
}

#[async_trait]
pub trait StorageHealth: Send + Sync {
    /// Returns an error if the backend cannot serve requests.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// The full capability set required by the API.
pub trait Store:
    UserStore
    + CategoryStore
    + TagStore
    + LayoutStore
    + TeamStore
    + ShareStore
    + CommentStore
    + StorageHealth
{
}

impl<T> Store for T where
    T: UserStore
        + CategoryStore
        + TagStore
        + LayoutStore
        + TeamStore
        + ShareStore
        + CommentStore
        + StorageHealth
{
}
