//! Repository for the `teams`, `team_members` and `team_invitations` tables.

use layoutsmith_core::invitation::{self, InvitationStatus};
use layoutsmith_core::roles::{TeamAuthority, TeamRole};
use layoutsmith_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::StoreError;
use crate::models::team::{NewInvitation, Team, TeamInvitation, TeamMember};
use crate::repositories::decode_error;

/// Column list for `teams` queries.
const TEAM_COLUMNS: &str = "id, name, description, created_by_user_id, created_at";

/// Column list for `team_members` queries.
const MEMBER_COLUMNS: &str = "team_id, user_id, role, joined_at";

/// Column list for `team_invitations` queries.
const INVITATION_COLUMNS: &str = "id, team_id, invited_user_id, invited_by, role, status, \
    layout_id, message, created_at, responded_at";

/// Provides team, membership and invitation operations.
pub struct TeamRepo;

impl TeamRepo {
    // -----------------------------------------------------------------------
    // Teams
    // -----------------------------------------------------------------------

    pub async fn create(
        pool: &PgPool,
        creator_id: DbId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Team, sqlx::Error> {
        let query = format!(
            "INSERT INTO teams (name, description, created_by_user_id) \
             VALUES ($1, $2, $3) \
             RETURNING {TEAM_COLUMNS}"
        );
        sqlx::query_as::<_, Team>(&query)
            .bind(name)
            .bind(description)
            .bind(creator_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Team>, sqlx::Error> {
        let query = format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1");
        sqlx::query_as::<_, Team>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Teams the user created or is a member of, newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Team>, sqlx::Error> {
        let query = format!(
            "SELECT {TEAM_COLUMNS} FROM teams \
             WHERE created_by_user_id = $1 \
                OR id IN (SELECT team_id FROM team_members WHERE user_id = $1) \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Team>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a team. Memberships, invitations and team shares cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The user's standing in the team. The creator has no membership row.
    pub async fn authority(
        pool: &PgPool,
        team_id: DbId,
        user_id: DbId,
    ) -> Result<Option<TeamAuthority>, sqlx::Error> {
        let row: Option<(bool, Option<String>)> = sqlx::query_as(
            "SELECT t.created_by_user_id = $2, tm.role \
             FROM teams t \
             LEFT JOIN team_members tm ON tm.team_id = t.id AND tm.user_id = $2 \
             WHERE t.id = $1",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        match row {
            Some((true, _)) => Ok(Some(TeamAuthority::Creator)),
            Some((false, Some(role))) => {
                let role: TeamRole = role.parse().map_err(decode_error)?;
                Ok(Some(TeamAuthority::Member(role)))
            }
            _ => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// List a team's members in join order.
    pub async fn list_members(pool: &PgPool, team_id: DbId) -> Result<Vec<TeamMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members \
             WHERE team_id = $1 \
             ORDER BY joined_at, user_id"
        );
        sqlx::query_as::<_, TeamMember>(&query)
            .bind(team_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a membership or update the role of an existing one.
    pub async fn upsert_member(
        pool: &PgPool,
        team_id: DbId,
        user_id: DbId,
        role: TeamRole,
    ) -> Result<TeamMember, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::upsert_member_inner(&mut *conn, team_id, user_id, role).await
    }

    async fn upsert_member_inner(
        conn: &mut PgConnection,
        team_id: DbId,
        user_id: DbId,
        role: TeamRole,
    ) -> Result<TeamMember, sqlx::Error> {
        let query = format!(
            "INSERT INTO team_members (team_id, user_id, role) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (team_id, user_id) DO UPDATE SET role = EXCLUDED.role \
             RETURNING {MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, TeamMember>(&query)
            .bind(team_id)
            .bind(user_id)
            .bind(role.as_str())
            .fetch_one(&mut *conn)
            .await
    }

    /// Returns `true` if a membership was removed.
    pub async fn remove_member(
        pool: &PgPool,
        team_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Invitations
    // -----------------------------------------------------------------------

    /// Insert a pending invitation. Violates `uq_team_invitations_pending`
    /// when the invitee already has an open invitation to the team.
    pub async fn create_invitation(
        pool: &PgPool,
        input: &NewInvitation,
    ) -> Result<TeamInvitation, sqlx::Error> {
        let query = format!(
            "INSERT INTO team_invitations \
                (team_id, invited_user_id, invited_by, role, layout_id, message) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {INVITATION_COLUMNS}"
        );
        sqlx::query_as::<_, TeamInvitation>(&query)
            .bind(input.team_id)
            .bind(input.invited_user_id)
            .bind(input.invited_by)
            .bind(input.role.as_str())
            .bind(input.layout_id)
            .bind(&input.message)
            .fetch_one(pool)
            .await
    }

    pub async fn find_invitation(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TeamInvitation>, sqlx::Error> {
        let query = format!("SELECT {INVITATION_COLUMNS} FROM team_invitations WHERE id = $1");
        sqlx::query_as::<_, TeamInvitation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Pending invitations addressed to the user, newest first.
    pub async fn pending_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<TeamInvitation>, sqlx::Error> {
        let query = format!(
            "SELECT {INVITATION_COLUMNS} FROM team_invitations \
             WHERE invited_user_id = $1 AND status = $2 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, TeamInvitation>(&query)
            .bind(user_id)
            .bind(InvitationStatus::Pending.as_str())
            .fetch_all(pool)
            .await
    }

    /// Apply the invitee's response in one transaction.
    ///
    /// The invitation row is locked first so two concurrent responses cannot
    /// both observe `pending`. Acceptance upserts the membership and, when
    /// the invitation names a layout, grants a direct share unless the
    /// invitee already holds one.
    pub async fn respond_invitation(
        pool: &PgPool,
        id: DbId,
        responder_id: DbId,
        accept: bool,
    ) -> Result<TeamInvitation, StoreError> {
        let mut tx = pool.begin().await?;

        let lock = format!(
            "SELECT {INVITATION_COLUMNS} FROM team_invitations WHERE id = $1 FOR UPDATE"
        );
        let current = sqlx::query_as::<_, TeamInvitation>(&lock)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "TeamInvitation",
                id,
            })?;

        let next = invitation::respond(
            id,
            current.status,
            current.invited_user_id,
            responder_id,
            accept,
        )?;

        let update = format!(
            "UPDATE team_invitations SET status = $2, responded_at = NOW() \
             WHERE id = $1 RETURNING {INVITATION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, TeamInvitation>(&update)
            .bind(id)
            .bind(next.as_str())
            .fetch_one(&mut *tx)
            .await?;

        if next == InvitationStatus::Accepted {
            Self::upsert_member_inner(
                &mut *tx,
                updated.team_id,
                updated.invited_user_id,
                updated.role,
            )
            .await?;

            if let Some(layout_id) = updated.layout_id {
                sqlx::query(
                    "INSERT INTO shared_layouts \
                        (layout_id, shared_by_user_id, shared_with_user_id, permissions) \
                     VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (layout_id, shared_with_user_id) \
                         WHERE shared_with_user_id IS NOT NULL DO NOTHING",
                )
                .bind(layout_id)
                .bind(updated.invited_by)
                .bind(updated.invited_user_id)
                .bind(updated.role.share_permission().as_str())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(updated)
    }
}
