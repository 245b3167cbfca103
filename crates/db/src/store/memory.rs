//! In-memory backend for tests and local development.
//!
//! All state lives in one arena behind a single `tokio::sync::Mutex`, so
//! every operation is atomic with respect to every other. Uniqueness
//! violations are reported with the same constraint names the PostgreSQL
//! schema uses.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use layoutsmith_core::access::{AccessFacts, TeamGrant};
use layoutsmith_core::error::CoreError;
use layoutsmith_core::invitation::{self, InvitationStatus};
use layoutsmith_core::roles::{TeamAuthority, TeamRole};
use layoutsmith_core::search::{LayoutSearch, SearchScope};
use layoutsmith_core::types::DbId;
use layoutsmith_core::versioning::{build_history, version_label, walk_to_root, ROOT_VERSION_LABEL};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::category::{Category, UpdateCategory};
use crate::models::comment::{LayoutComment, NewComment};
use crate::models::layout::{GeneratedLayout, LayoutSummary, NewLayoutVersion, NewRootLayout};
use crate::models::share::{NewShare, ShareTarget, SharedLayout};
use crate::models::tag::{Tag, UpdateTag};
use crate::models::team::{NewInvitation, Team, TeamInvitation, TeamMember};
use crate::models::user::{CreateUser, User};
use crate::store::{
    CategoryStore, CommentStore, LayoutStore, NewLabel, ShareStore, StorageHealth, TagStore,
    TeamStore, UserStore,
};

/// Monotonic id counters, one per table.
#[derive(Default)]
struct Sequences {
    users: DbId,
    categories: DbId,
    tags: DbId,
    layouts: DbId,
    teams: DbId,
    invitations: DbId,
    shares: DbId,
    comments: DbId,
}

fn next(counter: &mut DbId) -> DbId {
    *counter += 1;
    *counter
}

#[derive(Default)]
struct Arena {
    seq: Sequences,
    users: BTreeMap<DbId, User>,
    categories: BTreeMap<DbId, Category>,
    tags: BTreeMap<DbId, Tag>,
    layouts: BTreeMap<DbId, GeneratedLayout>,
    /// `(layout_id, tag_id)`
    layout_tags: BTreeSet<(DbId, DbId)>,
    teams: BTreeMap<DbId, Team>,
    /// Keyed by `(team_id, user_id)`.
    members: BTreeMap<(DbId, DbId), TeamMember>,
    invitations: BTreeMap<DbId, TeamInvitation>,
    shares: BTreeMap<DbId, SharedLayout>,
    comments: BTreeMap<DbId, LayoutComment>,
}

impl Arena {
    /// Path from `layout_id` to its chain root.
    fn chain(&self, layout_id: DbId) -> Result<Vec<DbId>, StoreError> {
        Ok(walk_to_root(layout_id, |id| {
            self.layouts.get(&id).map(|l| l.parent_layout_id)
        })?)
    }

    fn authority(&self, team_id: DbId, user_id: DbId) -> Option<TeamAuthority> {
        let team = self.teams.get(&team_id)?;
        if team.created_by_user_id == user_id {
            return Some(TeamAuthority::Creator);
        }
        self.members
            .get(&(team_id, user_id))
            .map(|m| TeamAuthority::Member(m.role))
    }

    /// Whether a share row reaches the user directly or through a team.
    fn share_reaches(&self, share: &SharedLayout, user_id: DbId) -> bool {
        match share.target() {
            Some(ShareTarget::User(id)) => id == user_id,
            Some(ShareTarget::Team(team_id)) => self.authority(team_id, user_id).is_some(),
            None => false,
        }
    }

    fn accessible_to(&self, layout: &GeneratedLayout, user_id: DbId) -> bool {
        if layout.owner_user_id == user_id {
            return true;
        }
        let Ok(chain) = self.chain(layout.id) else {
            return false;
        };
        self.shares
            .values()
            .any(|s| chain.contains(&s.layout_id) && self.share_reaches(s, user_id))
    }

    fn tags_of(&self, layout_id: DbId) -> Vec<DbId> {
        self.layout_tags
            .range((layout_id, DbId::MIN)..=(layout_id, DbId::MAX))
            .map(|&(_, tag_id)| tag_id)
            .collect()
    }

    fn upsert_member(&mut self, team_id: DbId, user_id: DbId, role: TeamRole) -> TeamMember {
        let member = self
            .members
            .entry((team_id, user_id))
            .and_modify(|m| m.role = role)
            .or_insert_with(|| TeamMember {
                team_id,
                user_id,
                role,
                joined_at: Utc::now(),
            });
        member.clone()
    }

    fn upsert_share(&mut self, input: &NewShare) -> SharedLayout {
        let existing = self
            .shares
            .values_mut()
            .find(|s| s.layout_id == input.layout_id && s.target() == Some(input.target));

        if let Some(share) = existing {
            share.permissions = input.permissions;
            share.shared_by_user_id = input.shared_by_user_id;
            share.shared_at = Utc::now();
            return share.clone();
        }

        let id = next(&mut self.seq.shares);
        let share = SharedLayout {
            id,
            layout_id: input.layout_id,
            shared_by_user_id: input.shared_by_user_id,
            shared_with_user_id: input.target.user_id(),
            shared_with_team_id: input.target.team_id(),
            permissions: input.permissions,
            shared_at: Utc::now(),
        };
        self.shares.insert(id, share.clone());
        share
    }
}

/// Newest first, ties broken by id.
fn newest_first(mut rows: Vec<LayoutSummary>) -> Vec<LayoutSummary> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    rows
}

/// Store that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    arena: Mutex<Arena>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        let mut arena = self.arena.lock().await;
        if arena.users.values().any(|u| u.username == input.username) {
            return Err(StoreError::duplicate("uq_users_username"));
        }
        if arena.users.values().any(|u| u.email == input.email) {
            return Err(StoreError::duplicate("uq_users_email"));
        }

        let id = next(&mut arena.seq.users);
        let user = User {
            id,
            username: input.username.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            created_at: Utc::now(),
        };
        arena.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.arena.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let arena = self.arena.lock().await;
        Ok(arena.users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn create_category(&self, input: &NewLabel) -> Result<Category, StoreError> {
        let mut arena = self.arena.lock().await;
        let taken = arena
            .categories
            .values()
            .any(|c| c.owner_user_id == input.owner_user_id && c.name == input.name);
        if taken {
            return Err(StoreError::duplicate("uq_categories_owner_name"));
        }

        let id = next(&mut arena.seq.categories);
        let now = Utc::now();
        let category = Category {
            id,
            name: input.name.clone(),
            color: input.color.clone(),
            description: input.description.clone(),
            owner_user_id: input.owner_user_id,
            created_at: now,
            updated_at: now,
        };
        arena.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn find_category(&self, id: DbId) -> Result<Option<Category>, StoreError> {
        Ok(self.arena.lock().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self, owner_user_id: DbId) -> Result<Vec<Category>, StoreError> {
        let arena = self.arena.lock().await;
        let mut rows: Vec<Category> = arena
            .categories
            .values()
            .filter(|c| c.owner_user_id == owner_user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn update_category(
        &self,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, StoreError> {
        let mut arena = self.arena.lock().await;
        let Some(owner) = arena.categories.get(&id).map(|c| c.owner_user_id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            let taken = arena
                .categories
                .values()
                .any(|c| c.id != id && c.owner_user_id == owner && &c.name == name);
            if taken {
                return Err(StoreError::duplicate("uq_categories_owner_name"));
            }
        }

        let Some(category) = arena.categories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            category.name = name.clone();
        }
        if let Some(color) = &input.color {
            category.color = color.clone();
        }
        if let Some(description) = &input.description {
            category.description = description.clone();
        }
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: DbId) -> Result<bool, StoreError> {
        let mut arena = self.arena.lock().await;
        if arena.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for layout in arena.layouts.values_mut() {
            if layout.category_id == Some(id) {
                layout.category_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn create_tag(&self, input: &NewLabel) -> Result<Tag, StoreError> {
        let mut arena = self.arena.lock().await;
        let taken = arena
            .tags
            .values()
            .any(|t| t.owner_user_id == input.owner_user_id && t.name == input.name);
        if taken {
            return Err(StoreError::duplicate("uq_tags_owner_name"));
        }

        let id = next(&mut arena.seq.tags);
        let now = Utc::now();
        let tag = Tag {
            id,
            name: input.name.clone(),
            color: input.color.clone(),
            description: input.description.clone(),
            owner_user_id: input.owner_user_id,
            created_at: now,
            updated_at: now,
        };
        arena.tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn find_tag(&self, id: DbId) -> Result<Option<Tag>, StoreError> {
        Ok(self.arena.lock().await.tags.get(&id).cloned())
    }

    async fn list_tags(&self, owner_user_id: DbId) -> Result<Vec<Tag>, StoreError> {
        let arena = self.arena.lock().await;
        let mut rows: Vec<Tag> = arena
            .tags
            .values()
            .filter(|t| t.owner_user_id == owner_user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn update_tag(&self, id: DbId, input: &UpdateTag) -> Result<Option<Tag>, StoreError> {
        let mut arena = self.arena.lock().await;
        let Some(owner) = arena.tags.get(&id).map(|t| t.owner_user_id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            let taken = arena
                .tags
                .values()
                .any(|t| t.id != id && t.owner_user_id == owner && &t.name == name);
            if taken {
                return Err(StoreError::duplicate("uq_tags_owner_name"));
            }
        }

        let Some(tag) = arena.tags.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            tag.name = name.clone();
        }
        if let Some(color) = &input.color {
            tag.color = color.clone();
        }
        if let Some(description) = &input.description {
            tag.description = description.clone();
        }
        tag.updated_at = Utc::now();
        Ok(Some(tag.clone()))
    }

    async fn delete_tag(&self, id: DbId) -> Result<bool, StoreError> {
        let mut arena = self.arena.lock().await;
        if arena.tags.remove(&id).is_none() {
            return Ok(false);
        }
        arena.layout_tags.retain(|&(_, tag_id)| tag_id != id);
        Ok(true)
    }

    async fn attach_tag(&self, layout_id: DbId, tag_id: DbId) -> Result<bool, StoreError> {
        let mut arena = self.arena.lock().await;
        if !arena.layouts.contains_key(&layout_id) {
            return Err(StoreError::NotFound {
                entity: "GeneratedLayout",
                id: layout_id,
            });
        }
        if !arena.tags.contains_key(&tag_id) {
            return Err(StoreError::NotFound {
                entity: "Tag",
                id: tag_id,
            });
        }
        Ok(arena.layout_tags.insert((layout_id, tag_id)))
    }

    async fn detach_tag(&self, layout_id: DbId, tag_id: DbId) -> Result<bool, StoreError> {
        Ok(self.arena.lock().await.layout_tags.remove(&(layout_id, tag_id)))
    }

    async fn layout_tags(&self, layout_id: DbId) -> Result<Vec<Tag>, StoreError> {
        let arena = self.arena.lock().await;
        let mut rows: Vec<Tag> = arena
            .tags_of(layout_id)
            .into_iter()
            .filter_map(|id| arena.tags.get(&id).cloned())
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}

#[async_trait]
impl LayoutStore for MemoryStore {
    async fn create_root(&self, input: &NewRootLayout) -> Result<GeneratedLayout, StoreError> {
        let mut arena = self.arena.lock().await;
        let taken = arena.layouts.values().any(|l| {
            l.parent_layout_id.is_none()
                && l.owner_user_id == input.owner_user_id
                && l.title == input.title
        });
        if taken {
            return Err(StoreError::duplicate("uq_generated_layouts_owner_root_title"));
        }

        let id = next(&mut arena.seq.layouts);
        let now = Utc::now();
        let layout = GeneratedLayout {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            generated_code: input.generated_code.clone(),
            input_method: input.input_method,
            additional_context: input.additional_context.clone(),
            owner_user_id: input.owner_user_id,
            category_id: input.category_id,
            is_public: input.is_public,
            parent_layout_id: None,
            version_number: ROOT_VERSION_LABEL.to_string(),
            changes_description: String::new(),
            created_at: now,
            updated_at: now,
        };
        arena.layouts.insert(id, layout.clone());
        Ok(layout)
    }

    async fn create_version(
        &self,
        input: &NewLayoutVersion,
    ) -> Result<GeneratedLayout, StoreError> {
        let mut arena = self.arena.lock().await;
        let parent = arena
            .layouts
            .get(&input.parent_layout_id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "GeneratedLayout",
                id: input.parent_layout_id,
            })?;

        if parent.owner_user_id != input.owner_user_id {
            return Err(CoreError::Forbidden(format!(
                "Layout {} belongs to another user; versions keep their parent's owner",
                parent.id
            ))
            .into());
        }

        let chain = arena.chain(parent.id)?;
        let root_id = chain.last().copied().unwrap_or(parent.id);
        let nodes: Vec<LayoutSummary> = arena.layouts.values().map(LayoutSummary::from).collect();
        let existing = build_history(root_id, nodes).len() as i64 - 1;

        let id = next(&mut arena.seq.layouts);
        let now = Utc::now();
        let layout = GeneratedLayout {
            id,
            title: parent.title.clone(),
            description: input
                .description
                .clone()
                .unwrap_or_else(|| parent.description.clone()),
            generated_code: input.generated_code.clone(),
            input_method: parent.input_method,
            additional_context: parent.additional_context.clone(),
            owner_user_id: parent.owner_user_id,
            category_id: input.category_id.or(parent.category_id),
            is_public: input.is_public.unwrap_or(parent.is_public),
            parent_layout_id: Some(parent.id),
            version_number: version_label(existing),
            changes_description: input.changes_description.clone(),
            created_at: now,
            updated_at: now,
        };
        arena.layouts.insert(id, layout.clone());
        Ok(layout)
    }

    async fn find_layout(&self, id: DbId) -> Result<Option<GeneratedLayout>, StoreError> {
        Ok(self.arena.lock().await.layouts.get(&id).cloned())
    }

    async fn root_title_exists(
        &self,
        owner_user_id: DbId,
        title: &str,
    ) -> Result<bool, StoreError> {
        let arena = self.arena.lock().await;
        Ok(arena.layouts.values().any(|l| {
            l.parent_layout_id.is_none() && l.owner_user_id == owner_user_id && l.title == title
        }))
    }

    async fn list_owned_layouts(
        &self,
        owner_user_id: DbId,
    ) -> Result<Vec<LayoutSummary>, StoreError> {
        let arena = self.arena.lock().await;
        Ok(newest_first(
            arena
                .layouts
                .values()
                .filter(|l| l.owner_user_id == owner_user_id)
                .map(LayoutSummary::from)
                .collect(),
        ))
    }

    async fn version_history(&self, layout_id: DbId) -> Result<Vec<LayoutSummary>, StoreError> {
        let arena = self.arena.lock().await;
        let chain = arena.chain(layout_id)?;
        let root_id = chain.last().copied().unwrap_or(layout_id);
        let nodes = arena.layouts.values().map(LayoutSummary::from).collect();
        Ok(build_history(root_id, nodes))
    }

    async fn update_code(
        &self,
        id: DbId,
        generated_code: &str,
    ) -> Result<Option<GeneratedLayout>, StoreError> {
        let mut arena = self.arena.lock().await;
        Ok(arena.layouts.get_mut(&id).map(|layout| {
            layout.generated_code = generated_code.to_string();
            layout.updated_at = Utc::now();
            layout.clone()
        }))
    }

    async fn set_visibility(
        &self,
        id: DbId,
        is_public: bool,
    ) -> Result<Option<GeneratedLayout>, StoreError> {
        let mut arena = self.arena.lock().await;
        Ok(arena.layouts.get_mut(&id).map(|layout| {
            layout.is_public = is_public;
            layout.updated_at = Utc::now();
            layout.clone()
        }))
    }

    async fn set_category(
        &self,
        id: DbId,
        category_id: Option<DbId>,
    ) -> Result<Option<GeneratedLayout>, StoreError> {
        let mut arena = self.arena.lock().await;
        Ok(arena.layouts.get_mut(&id).map(|layout| {
            layout.category_id = category_id;
            layout.updated_at = Utc::now();
            layout.clone()
        }))
    }

    async fn search_layouts(
        &self,
        search: &LayoutSearch,
    ) -> Result<Vec<LayoutSummary>, StoreError> {
        let arena = self.arena.lock().await;
        let matches: Vec<LayoutSummary> = arena
            .layouts
            .values()
            .filter(|l| match search.scope {
                SearchScope::Owned => l.owner_user_id == search.user_id,
                SearchScope::Accessible => arena.accessible_to(l, search.user_id),
                SearchScope::Public => l.is_public,
            })
            .filter(|l| search.category_id.map_or(true, |c| l.category_id == Some(c)))
            .filter(|l| search.matches_tags(&arena.tags_of(l.id)))
            .filter(|l| search.matches_text(&l.title, &l.description))
            .filter(|l| search.is_public.map_or(true, |p| l.is_public == p))
            .filter(|l| search.matches_dates(l.created_at))
            .map(LayoutSummary::from)
            .collect();

        Ok(newest_first(matches)
            .into_iter()
            .skip(search.offset.max(0) as usize)
            .take(search.limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn create_team(
        &self,
        creator_id: DbId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Team, StoreError> {
        let mut arena = self.arena.lock().await;
        let id = next(&mut arena.seq.teams);
        let team = Team {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_by_user_id: creator_id,
            created_at: Utc::now(),
        };
        arena.teams.insert(id, team.clone());
        Ok(team)
    }

    async fn find_team(&self, id: DbId) -> Result<Option<Team>, StoreError> {
        Ok(self.arena.lock().await.teams.get(&id).cloned())
    }

    async fn list_teams_for_user(&self, user_id: DbId) -> Result<Vec<Team>, StoreError> {
        let arena = self.arena.lock().await;
        let mut rows: Vec<Team> = arena
            .teams
            .values()
            .filter(|t| arena.authority(t.id, user_id).is_some())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn delete_team(&self, id: DbId) -> Result<bool, StoreError> {
        let mut arena = self.arena.lock().await;
        if arena.teams.remove(&id).is_none() {
            return Ok(false);
        }
        arena.members.retain(|&(team_id, _), _| team_id != id);
        arena.invitations.retain(|_, i| i.team_id != id);
        arena.shares.retain(|_, s| s.shared_with_team_id != Some(id));
        Ok(true)
    }

    async fn team_authority(
        &self,
        team_id: DbId,
        user_id: DbId,
    ) -> Result<Option<TeamAuthority>, StoreError> {
        Ok(self.arena.lock().await.authority(team_id, user_id))
    }

    async fn list_members(&self, team_id: DbId) -> Result<Vec<TeamMember>, StoreError> {
        let arena = self.arena.lock().await;
        let mut rows: Vec<TeamMember> = arena
            .members
            .values()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.user_id.cmp(&b.user_id)));
        Ok(rows)
    }

    async fn upsert_member(
        &self,
        team_id: DbId,
        user_id: DbId,
        role: TeamRole,
    ) -> Result<TeamMember, StoreError> {
        Ok(self.arena.lock().await.upsert_member(team_id, user_id, role))
    }

    async fn remove_member(&self, team_id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        Ok(self
            .arena
            .lock()
            .await
            .members
            .remove(&(team_id, user_id))
            .is_some())
    }

    async fn create_invitation(
        &self,
        input: &NewInvitation,
    ) -> Result<TeamInvitation, StoreError> {
        let mut arena = self.arena.lock().await;
        let open = arena.invitations.values().any(|i| {
            i.team_id == input.team_id
                && i.invited_user_id == input.invited_user_id
                && i.status == InvitationStatus::Pending
        });
        if open {
            return Err(StoreError::duplicate("uq_team_invitations_pending"));
        }

        let id = next(&mut arena.seq.invitations);
        let invitation = TeamInvitation {
            id,
            team_id: input.team_id,
            invited_user_id: input.invited_user_id,
            invited_by: input.invited_by,
            role: input.role,
            status: InvitationStatus::Pending,
            layout_id: input.layout_id,
            message: input.message.clone(),
            created_at: Utc::now(),
            responded_at: None,
        };
        arena.invitations.insert(id, invitation.clone());
        Ok(invitation)
    }

    async fn find_invitation(&self, id: DbId) -> Result<Option<TeamInvitation>, StoreError> {
        Ok(self.arena.lock().await.invitations.get(&id).cloned())
    }

    async fn pending_invitations(
        &self,
        user_id: DbId,
    ) -> Result<Vec<TeamInvitation>, StoreError> {
        let arena = self.arena.lock().await;
        let mut rows: Vec<TeamInvitation> = arena
            .invitations
            .values()
            .filter(|i| i.invited_user_id == user_id && i.status == InvitationStatus::Pending)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn respond_invitation(
        &self,
        id: DbId,
        responder_id: DbId,
        accept: bool,
    ) -> Result<TeamInvitation, StoreError> {
        let mut arena = self.arena.lock().await;
        let current = arena
            .invitations
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "TeamInvitation",
                id,
            })?;

        let status = invitation::respond(
            id,
            current.status,
            current.invited_user_id,
            responder_id,
            accept,
        )?;

        let updated = TeamInvitation {
            status,
            responded_at: Some(Utc::now()),
            ..current
        };
        arena.invitations.insert(id, updated.clone());

        if status == InvitationStatus::Accepted {
            arena.upsert_member(updated.team_id, updated.invited_user_id, updated.role);

            if let Some(layout_id) = updated.layout_id {
                let target = ShareTarget::User(updated.invited_user_id);
                let already_shared = arena
                    .shares
                    .values()
                    .any(|s| s.layout_id == layout_id && s.target() == Some(target));
                if !already_shared && arena.layouts.contains_key(&layout_id) {
                    arena.upsert_share(&NewShare {
                        layout_id,
                        shared_by_user_id: updated.invited_by,
                        target,
                        permissions: updated.role.share_permission(),
                    });
                }
            }
        }

        Ok(updated)
    }
}

#[async_trait]
impl ShareStore for MemoryStore {
    async fn upsert_share(&self, input: &NewShare) -> Result<SharedLayout, StoreError> {
        let mut arena = self.arena.lock().await;
        if !arena.layouts.contains_key(&input.layout_id) {
            return Err(StoreError::NotFound {
                entity: "GeneratedLayout",
                id: input.layout_id,
            });
        }
        Ok(arena.upsert_share(input))
    }

    async fn find_share(&self, id: DbId) -> Result<Option<SharedLayout>, StoreError> {
        Ok(self.arena.lock().await.shares.get(&id).cloned())
    }

    async fn list_shares(&self, layout_id: DbId) -> Result<Vec<SharedLayout>, StoreError> {
        let arena = self.arena.lock().await;
        let mut rows: Vec<SharedLayout> = arena
            .shares
            .values()
            .filter(|s| s.layout_id == layout_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.shared_at.cmp(&a.shared_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn delete_share(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(self.arena.lock().await.shares.remove(&id).is_some())
    }

    async fn shared_with_user(&self, user_id: DbId) -> Result<Vec<LayoutSummary>, StoreError> {
        let arena = self.arena.lock().await;
        Ok(newest_first(
            arena
                .layouts
                .values()
                .filter(|l| l.owner_user_id != user_id && arena.accessible_to(l, user_id))
                .map(LayoutSummary::from)
                .collect(),
        ))
    }

    async fn access_facts(
        &self,
        user_id: Option<DbId>,
        layout_id: DbId,
    ) -> Result<Option<AccessFacts>, StoreError> {
        let arena = self.arena.lock().await;
        let Some(layout) = arena.layouts.get(&layout_id) else {
            return Ok(None);
        };

        let mut facts = AccessFacts {
            is_public: layout.is_public,
            ..Default::default()
        };
        let Some(user_id) = user_id else {
            return Ok(Some(facts));
        };
        if layout.owner_user_id == user_id {
            facts.is_owner = true;
            return Ok(Some(facts));
        }

        let chain = arena.chain(layout_id)?;
        for share in arena.shares.values().filter(|s| chain.contains(&s.layout_id)) {
            match share.target() {
                Some(ShareTarget::User(id)) if id == user_id => {
                    facts.direct_shares.push(share.permissions);
                }
                Some(ShareTarget::Team(team_id)) => {
                    if let Some(authority) = arena.authority(team_id, user_id) {
                        facts.team_grants.push(TeamGrant {
                            permission: share.permissions,
                            authority,
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(Some(facts))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn add_comment(&self, input: &NewComment) -> Result<LayoutComment, StoreError> {
        let mut arena = self.arena.lock().await;
        if !arena.layouts.contains_key(&input.layout_id) {
            return Err(StoreError::NotFound {
                entity: "GeneratedLayout",
                id: input.layout_id,
            });
        }
        let id = next(&mut arena.seq.comments);
        let comment = LayoutComment {
            id,
            layout_id: input.layout_id,
            user_id: input.user_id,
            comment: input.comment.clone(),
            position_x: input.position_x,
            position_y: input.position_y,
            resolved: false,
            created_at: Utc::now(),
        };
        arena.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: DbId) -> Result<Option<LayoutComment>, StoreError> {
        Ok(self.arena.lock().await.comments.get(&id).cloned())
    }

    async fn list_comments(&self, layout_id: DbId) -> Result<Vec<LayoutComment>, StoreError> {
        let arena = self.arena.lock().await;
        let mut rows: Vec<LayoutComment> = arena
            .comments
            .values()
            .filter(|c| c.layout_id == layout_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn resolve_comment(&self, id: DbId) -> Result<Option<LayoutComment>, StoreError> {
        let mut arena = self.arena.lock().await;
        Ok(arena.comments.get_mut(&id).map(|comment| {
            comment.resolved = true;
            comment.clone()
        }))
    }
}

#[async_trait]
impl StorageHealth for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
