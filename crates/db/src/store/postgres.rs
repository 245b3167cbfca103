//! PostgreSQL backend. Every method delegates to a repository.

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
use crate::repositories::{
    CategoryRepo, CommentRepo, LayoutRepo, ShareRepo, TagRepo, TeamRepo, UserRepo,
};
use crate::store::{
    CategoryStore, CommentStore, LayoutStore, NewLabel, ShareStore, StorageHealth, TagStore,
    TeamStore, UserStore,
};
use crate::DbPool;

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_username(&self.pool, username).await?)
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn create_category(&self, input: &NewLabel) -> Result<Category, StoreError> {
        Ok(CategoryRepo::create(&self.pool, input).await?)
    }

    async fn find_category(&self, id: DbId) -> Result<Option<Category>, StoreError> {
        Ok(CategoryRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_categories(&self, owner_user_id: DbId) -> Result<Vec<Category>, StoreError> {
        Ok(CategoryRepo::list_by_owner(&self.pool, owner_user_id).await?)
    }

    async fn update_category(
        &self,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, StoreError> {
        Ok(CategoryRepo::update(&self.pool, id, input).await?)
    }

    async fn delete_category(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(CategoryRepo::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl TagStore for PgStore {
    async fn create_tag(&self, input: &NewLabel) -> Result<Tag, StoreError> {
        Ok(TagRepo::create(&self.pool, input).await?)
    }

    async fn find_tag(&self, id: DbId) -> Result<Option<Tag>, StoreError> {
        Ok(TagRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_tags(&self, owner_user_id: DbId) -> Result<Vec<Tag>, StoreError> {
        Ok(TagRepo::list_by_owner(&self.pool, owner_user_id).await?)
    }

    async fn update_tag(&self, id: DbId, input: &UpdateTag) -> Result<Option<Tag>, StoreError> {
        Ok(TagRepo::update(&self.pool, id, input).await?)
    }

    async fn delete_tag(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(TagRepo::delete(&self.pool, id).await?)
    }

    async fn attach_tag(&self, layout_id: DbId, tag_id: DbId) -> Result<bool, StoreError> {
        Ok(TagRepo::attach(&self.pool, layout_id, tag_id).await?)
    }

    async fn detach_tag(&self, layout_id: DbId, tag_id: DbId) -> Result<bool, StoreError> {
        Ok(TagRepo::detach(&self.pool, layout_id, tag_id).await?)
    }

    async fn layout_tags(&self, layout_id: DbId) -> Result<Vec<Tag>, StoreError> {
        Ok(TagRepo::list_for_layout(&self.pool, layout_id).await?)
    }
}

#[async_trait]
impl LayoutStore for PgStore {
    async fn create_root(&self, input: &NewRootLayout) -> Result<GeneratedLayout, StoreError> {
        Ok(LayoutRepo::create_root(&self.pool, input).await?)
    }

    async fn create_version(
        &self,
        input: &NewLayoutVersion,
    ) -> Result<GeneratedLayout, StoreError> {
        LayoutRepo::create_version(&self.pool, input).await
    }

    async fn find_layout(&self, id: DbId) -> Result<Option<GeneratedLayout>, StoreError> {
        Ok(LayoutRepo::find_by_id(&self.pool, id).await?)
    }

    async fn root_title_exists(
        &self,
        owner_user_id: DbId,
        title: &str,
    ) -> Result<bool, StoreError> {
        Ok(LayoutRepo::root_title_exists(&self.pool, owner_user_id, title).await?)
    }

    async fn list_owned_layouts(
        &self,
        owner_user_id: DbId,
    ) -> Result<Vec<LayoutSummary>, StoreError> {
        Ok(LayoutRepo::list_by_owner(&self.pool, owner_user_id).await?)
    }

    async fn version_history(&self, layout_id: DbId) -> Result<Vec<LayoutSummary>, StoreError> {
        LayoutRepo::version_history(&self.pool, layout_id).await
    }

    async fn update_code(
        &self,
        id: DbId,
        generated_code: &str,
    ) -> Result<Option<GeneratedLayout>, StoreError> {
        Ok(LayoutRepo::update_code(&self.pool, id, generated_code).await?)
    }

    async fn set_visibility(
        &self,
        id: DbId,
        is_public: bool,
    ) -> Result<Option<GeneratedLayout>, StoreError> {
        Ok(LayoutRepo::set_visibility(&self.pool, id, is_public).await?)
    }

    async fn set_category(
        &self,
        id: DbId,
        category_id: Option<DbId>,
    ) -> Result<Option<GeneratedLayout>, StoreError> {
        Ok(LayoutRepo::set_category(&self.pool, id, category_id).await?)
    }

    async fn search_layouts(
        &self,
        search: &LayoutSearch,
    ) -> Result<Vec<LayoutSummary>, StoreError> {
        Ok(LayoutRepo::search(&self.pool, search).await?)
    }
}

#[async_trait]
impl TeamStore for PgStore {
    async fn create_team(
        &self,
        creator_id: DbId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Team, StoreError> {
        Ok(TeamRepo::create(&self.pool, creator_id, name, description).await?)
    }

    async fn find_team(&self, id: DbId) -> Result<Option<Team>, StoreError> {
        Ok(TeamRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_teams_for_user(&self, user_id: DbId) -> Result<Vec<Team>, StoreError> {
        Ok(TeamRepo::list_for_user(&self.pool, user_id).await?)
    }

    async fn delete_team(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(TeamRepo::delete(&self.pool, id).await?)
    }

    async fn team_authority(
        &self,
        team_id: DbId,
        user_id: DbId,
    ) -> Result<Option<TeamAuthority>, StoreError> {
        Ok(TeamRepo::authority(&self.pool, team_id, user_id).await?)
    }

    async fn list_members(&self, team_id: DbId) -> Result<Vec<TeamMember>, StoreError> {
        Ok(TeamRepo::list_members(&self.pool, team_id).await?)
    }

    async fn upsert_member(
        &self,
        team_id: DbId,
        user_id: DbId,
        role: TeamRole,
    ) -> Result<TeamMember, StoreError> {
        Ok(TeamRepo::upsert_member(&self.pool, team_id, user_id, role).await?)
    }

    async fn remove_member(&self, team_id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        Ok(TeamRepo::remove_member(&self.pool, team_id, user_id).await?)
    }

    async fn create_invitation(
        &self,
        input: &NewInvitation,
    ) -> Result<TeamInvitation, StoreError> {
        Ok(TeamRepo::create_invitation(&self.pool, input).await?)
    }

    async fn find_invitation(&self, id: DbId) -> Result<Option<TeamInvitation>, StoreError> {
        Ok(TeamRepo::find_invitation(&self.pool, id).await?)
    }

    async fn pending_invitations(
        &self,
        user_id: DbId,
    ) -> Result<Vec<TeamInvitation>, StoreError> {
        Ok(TeamRepo::pending_for_user(&self.pool, user_id).await?)
    }

    async fn respond_invitation(
        &self,
        id: DbId,
        responder_id: DbId,
        accept: bool,
    ) -> Result<TeamInvitation, StoreError> {
        TeamRepo::respond_invitation(&self.pool, id, responder_id, accept).await
    }
}

#[async_trait]
impl ShareStore for PgStore {
    async fn upsert_share(&self, input: &NewShare) -> Result<SharedLayout, StoreError> {
        Ok(ShareRepo::upsert(&self.pool, input).await?)
    }

    async fn find_share(&self, id: DbId) -> Result<Option<SharedLayout>, StoreError> {
        Ok(ShareRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_shares(&self, layout_id: DbId) -> Result<Vec<SharedLayout>, StoreError> {
        Ok(ShareRepo::list_for_layout(&self.pool, layout_id).await?)
    }

    async fn delete_share(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(ShareRepo::delete(&self.pool, id).await?)
    }

    async fn shared_with_user(&self, user_id: DbId) -> Result<Vec<LayoutSummary>, StoreError> {
        Ok(ShareRepo::shared_with_user(&self.pool, user_id).await?)
    }

    async fn access_facts(
        &self,
        user_id: Option<DbId>,
        layout_id: DbId,
    ) -> Result<Option<AccessFacts>, StoreError> {
        Ok(ShareRepo::access_facts(&self.pool, user_id, layout_id).await?)
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn add_comment(&self, input: &NewComment) -> Result<LayoutComment, StoreError> {
        Ok(CommentRepo::create(&self.pool, input).await?)
    }

    async fn find_comment(&self, id: DbId) -> Result<Option<LayoutComment>, StoreError> {
        Ok(CommentRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_comments(&self, layout_id: DbId) -> Result<Vec<LayoutComment>, StoreError> {
        Ok(CommentRepo::list_for_layout(&self.pool, layout_id).await?)
    }

    async fn resolve_comment(&self, id: DbId) -> Result<Option<LayoutComment>, StoreError> {
        Ok(CommentRepo::resolve(&self.pool, id).await?)
    }
}

#[async_trait]
impl StorageHealth for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}
