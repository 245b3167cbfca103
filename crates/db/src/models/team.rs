//! Team, membership and invitation models and DTOs.

use layoutsmith_core::invitation::InvitationStatus;
use layoutsmith_core::roles::TeamRole;
use layoutsmith_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `teams` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Team {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_by_user_id: DbId,
    pub created_at: Timestamp,
}

/// DTO for creating a team.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeam {
    pub name: String,
    pub description: Option<String>,
}

/// A row from the `team_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeamMember {
    pub team_id: DbId,
    pub user_id: DbId,
    #[sqlx(try_from = "String")]
    pub role: TeamRole,
    pub joined_at: Timestamp,
}

/// Request body for `POST /teams/{id}/members`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddTeamMember {
    pub user_id: DbId,
    pub role: TeamRole,
}

/// A row from the `team_invitations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TeamInvitation {
    pub id: DbId,
    pub team_id: DbId,
    pub invited_user_id: DbId,
    pub invited_by: DbId,
    #[sqlx(try_from = "String")]
    pub role: TeamRole,
    #[sqlx(try_from = "String")]
    pub status: InvitationStatus,
    pub layout_id: Option<DbId>,
    pub message: Option<String>,
    pub created_at: Timestamp,
    pub responded_at: Option<Timestamp>,
}

/// Request body for `POST /teams/{id}/invitations`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvitation {
    pub invited_user_id: DbId,
    pub role: TeamRole,
    pub layout_id: Option<DbId>,
    pub message: Option<String>,
}

/// Insert payload for an invitation, after authorization.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub team_id: DbId,
    pub invited_user_id: DbId,
    pub invited_by: DbId,
    pub role: TeamRole,
    pub layout_id: Option<DbId>,
    pub message: Option<String>,
}

/// Request body for `POST /invitations/{id}/respond`.
#[derive(Debug, Clone, Deserialize)]
pub struct RespondInvitation {
    pub accept: bool,
}
