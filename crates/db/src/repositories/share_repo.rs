//! Repository for the `shared_layouts` table and access-fact gathering.

use layoutsmith_core::access::{AccessFacts, TeamGrant};
use layoutsmith_core::roles::{SharePermission, TeamAuthority, TeamRole};
use layoutsmith_core::types::DbId;
use sqlx::{FromRow, PgPool};

use crate::models::layout::LayoutSummary;
use crate::models::share::{NewShare, ShareTarget, SharedLayout};
use crate::repositories::{decode_error, LayoutRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, layout_id, shared_by_user_id, shared_with_user_id, \
    shared_with_team_id, permissions, shared_at";

/// Recursive CTE `reachable(id)`: layouts shared with user `$1` plus every
/// version derived from them. Share rows on an ancestor reach its versions.
pub(crate) const REACHABLE_FOR_USER_CTE: &str = "\
    WITH RECURSIVE reachable AS ( \
        SELECT s.layout_id AS id FROM shared_layouts s \
        LEFT JOIN teams t ON t.id = s.shared_with_team_id \
        LEFT JOIN team_members tm ON tm.team_id = s.shared_with_team_id AND tm.user_id = $1 \
        WHERE s.shared_with_user_id = $1 \
           OR t.created_by_user_id = $1 \
           OR tm.user_id IS NOT NULL \
        UNION \
        SELECT g.id FROM generated_layouts g \
        JOIN reachable r ON g.parent_layout_id = r.id \
    ) ";

/// A team share on the chain, joined with the user's standing in the team.
#[derive(Debug, FromRow)]
struct TeamGrantRow {
    permissions: String,
    is_creator: bool,
    member_role: Option<String>,
}

impl TeamGrantRow {
    fn into_grant(self) -> Result<Option<TeamGrant>, sqlx::Error> {
        let permission: SharePermission = self.permissions.parse().map_err(decode_error)?;
        let authority = if self.is_creator {
            TeamAuthority::Creator
        } else {
            match self.member_role {
                Some(role) => TeamAuthority::Member(role.parse::<TeamRole>().map_err(decode_error)?),
                None => return Ok(None),
            }
        };
        Ok(Some(TeamGrant {
            permission,
            authority,
        }))
    }
}

/// Provides share upserts, listing and access-fact queries.
pub struct ShareRepo;

impl ShareRepo {
    /// Share a layout, or update the permission of the existing share with
    /// the same target.
    pub async fn upsert(pool: &PgPool, input: &NewShare) -> Result<SharedLayout, sqlx::Error> {
        let conflict_target = match input.target {
            ShareTarget::User(_) => {
                "(layout_id, shared_with_user_id) WHERE shared_with_user_id IS NOT NULL"
            }
            ShareTarget::Team(_) => {
                "(layout_id, shared_with_team_id) WHERE shared_with_team_id IS NOT NULL"
            }
        };
        let query = format!(
            "INSERT INTO shared_layouts \
                (layout_id, shared_by_user_id, shared_with_user_id, shared_with_team_id, permissions) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT {conflict_target} DO UPDATE SET \
                 permissions = EXCLUDED.permissions, \
                 shared_by_user_id = EXCLUDED.shared_by_user_id, \
                 shared_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SharedLayout>(&query)
            .bind(input.layout_id)
            .bind(input.shared_by_user_id)
            .bind(input.target.user_id())
            .bind(input.target.team_id())
            .bind(input.permissions.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SharedLayout>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM shared_layouts WHERE id = $1");
        sqlx::query_as::<_, SharedLayout>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the shares on one layout, newest first.
    pub async fn list_for_layout(
        pool: &PgPool,
        layout_id: DbId,
    ) -> Result<Vec<SharedLayout>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM shared_layouts \
             WHERE layout_id = $1 \
             ORDER BY shared_at DESC, id DESC"
        );
        sqlx::query_as::<_, SharedLayout>(&query)
            .bind(layout_id)
            .fetch_all(pool)
            .await
    }

    /// Returns `true` if a share was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM shared_layouts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Layouts the user reaches through a share, including versions derived
    /// from a shared layout, excluding the user's own.
    pub async fn shared_with_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<LayoutSummary>, sqlx::Error> {
        let query = format!(
            "{REACHABLE_FOR_USER_CTE}\
             SELECT id, title, description, owner_user_id, category_id, is_public, \
                    parent_layout_id, version_number, created_at, updated_at \
             FROM generated_layouts \
             WHERE owner_user_id <> $1 AND id IN (SELECT id FROM reachable) \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, LayoutSummary>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Gather ownership, visibility and every share that reaches the user on
    /// the layout or any of its ancestors.
    ///
    /// Returns `None` when the layout does not exist.
    pub async fn access_facts(
        pool: &PgPool,
        user_id: Option<DbId>,
        layout_id: DbId,
    ) -> Result<Option<AccessFacts>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let layout: Option<(DbId, bool)> =
            sqlx::query_as("SELECT owner_user_id, is_public FROM generated_layouts WHERE id = $1")
                .bind(layout_id)
                .fetch_optional(&mut *conn)
                .await?;
        let Some((owner_user_id, is_public)) = layout else {
            return Ok(None);
        };

        let Some(user_id) = user_id else {
            return Ok(Some(AccessFacts {
                is_public,
                ..Default::default()
            }));
        };

        if owner_user_id == user_id {
            return Ok(Some(AccessFacts {
                is_owner: true,
                is_public,
                ..Default::default()
            }));
        }

        let chain = LayoutRepo::ancestor_ids(&mut *conn, layout_id).await?;

        let direct: Vec<(String,)> = sqlx::query_as(
            "SELECT permissions FROM shared_layouts \
             WHERE layout_id = ANY($1) AND shared_with_user_id = $2",
        )
        .bind(&chain)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
        let direct_shares = direct
            .into_iter()
            .map(|(p,)| p.parse::<SharePermission>().map_err(decode_error))
            .collect::<Result<Vec<_>, _>>()?;

        let team_rows = sqlx::query_as::<_, TeamGrantRow>(
            "SELECT s.permissions, \
                    t.created_by_user_id = $2 AS is_creator, \
                    tm.role AS member_role \
             FROM shared_layouts s \
             JOIN teams t ON t.id = s.shared_with_team_id \
             LEFT JOIN team_members tm ON tm.team_id = t.id AND tm.user_id = $2 \
             WHERE s.layout_id = ANY($1) \
               AND (t.created_by_user_id = $2 OR tm.user_id IS NOT NULL)",
        )
        .bind(&chain)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut team_grants = Vec::with_capacity(team_rows.len());
        for row in team_rows {
            if let Some(grant) = row.into_grant()? {
                team_grants.push(grant);
            }
        }

        Ok(Some(AccessFacts {
            is_owner: false,
            is_public,
            direct_shares,
            team_grants,
        }))
    }
}
