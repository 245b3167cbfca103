//! Handlers for teams, team members and team invitations.
//!
//! A team's creator holds full authority without a member row. Member
//! management and invitations require [`TeamAuthority::can_manage_members`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::invitation::validate_message;
use layoutsmith_core::organization::{normalize_name, validate_description};
use layoutsmith_core::roles::{EffectiveRole, TeamAuthority};
use layoutsmith_core::types::DbId;
use layoutsmith_db::models::team::{
    AddTeamMember, CreateInvitation, CreateTeam, NewInvitation, RespondInvitation, Team,
    TeamMember,
};
use layoutsmith_db::{Store, TeamStore, UserStore};
use serde::Serialize;

use crate::access::require_role;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A team together with its member rows.
#[derive(Debug, Serialize)]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<TeamMember>,
}

// ---------------------------------------------------------------------------
// Authority helpers
// ---------------------------------------------------------------------------

/// Load a team and the caller's standing in it. Callers unrelated to the
/// team are rejected.
async fn team_with_authority(
    store: &dyn Store,
    team_id: DbId,
    user_id: DbId,
) -> AppResult<(Team, TeamAuthority)> {
    let team = store
        .find_team(team_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Team",
            id: team_id,
        }))?;
    let authority = store
        .team_authority(team_id, user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "You are not a member of this team".into(),
            ))
        })?;
    Ok((team, authority))
}

async fn require_team_manager(store: &dyn Store, team_id: DbId, user_id: DbId) -> AppResult<Team> {
    let (team, authority) = team_with_authority(store, team_id, user_id).await?;
    if !authority.can_manage_members() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the team creator or an admin can manage members".into(),
        )));
    }
    Ok(team)
}

async fn ensure_user_exists(store: &dyn Store, user_id: DbId) -> AppResult<()> {
    match store.find_user(user_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })),
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// POST /api/v1/teams
pub async fn create_team(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTeam>,
) -> AppResult<impl IntoResponse> {
    let name = normalize_name("Team", &input.name)?;
    validate_description(input.description.as_deref())?;

    let team = state
        .store
        .create_team(auth.user_id, &name, input.description.as_deref())
        .await?;

    tracing::info!(team_id = team.id, user_id = auth.user_id, "Team created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: team })))
}

/// GET /api/v1/teams
///
/// Teams the caller created or belongs to.
pub async fn list_teams(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let teams = state.store.list_teams_for_user(auth.user_id).await?;
    Ok(Json(DataResponse { data: teams }))
}

/// GET /api/v1/teams/{id}
pub async fn get_team(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (team, _) = team_with_authority(state.store.as_ref(), team_id, auth.user_id).await?;
    let members = state.store.list_members(team_id).await?;
    Ok(Json(DataResponse {
        data: TeamDetail { team, members },
    }))
}

/// DELETE /api/v1/teams/{id}
///
/// Creator only. Removes members, invitations and team shares with it.
pub async fn delete_team(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let (_, authority) = team_with_authority(state.store.as_ref(), team_id, auth.user_id).await?;
    if authority != TeamAuthority::Creator {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the team creator can delete the team".into(),
        )));
    }

    state.store.delete_team(team_id).await?;
    tracing::info!(team_id, user_id = auth.user_id, "Team deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// GET /api/v1/teams/{id}/members
pub async fn list_members(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    team_with_authority(state.store.as_ref(), team_id, auth.user_id).await?;
    let members = state.store.list_members(team_id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/teams/{id}/members
///
/// Adds a member, or changes the role of an existing one.
pub async fn add_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<DbId>,
    Json(input): Json<AddTeamMember>,
) -> AppResult<impl IntoResponse> {
    let team = require_team_manager(state.store.as_ref(), team_id, auth.user_id).await?;
    ensure_user_exists(state.store.as_ref(), input.user_id).await?;
    if input.user_id == team.created_by_user_id {
        return Err(AppError::Core(CoreError::Conflict(
            "The team creator already has full authority".into(),
        )));
    }

    let member = state
        .store
        .upsert_member(team_id, input.user_id, input.role)
        .await?;

    tracing::info!(
        team_id,
        member_id = input.user_id,
        role = %input.role,
        "Team member set",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

/// DELETE /api/v1/teams/{id}/members/{user_id}
pub async fn remove_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((team_id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let team = require_team_manager(state.store.as_ref(), team_id, auth.user_id).await?;
    if member_id == team.created_by_user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "The team creator cannot be removed".into(),
        )));
    }

    if !state.store.remove_member(team_id, member_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "TeamMember",
            id: member_id,
        }));
    }

    tracing::info!(team_id, member_id, user_id = auth.user_id, "Team member removed");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

/// POST /api/v1/teams/{id}/invitations
///
/// When `layout_id` is set the inviter must hold admin or better on that
/// layout, since acceptance grants the invitee a share on it.
pub async fn create_invitation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<DbId>,
    Json(input): Json<CreateInvitation>,
) -> AppResult<impl IntoResponse> {
    validate_message(input.message.as_deref())?;
    require_team_manager(state.store.as_ref(), team_id, auth.user_id).await?;
    ensure_user_exists(state.store.as_ref(), input.invited_user_id).await?;

    if state
        .store
        .team_authority(team_id, input.invited_user_id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "User is already part of this team".into(),
        )));
    }

    if let Some(layout_id) = input.layout_id {
        require_role(
            state.store.as_ref(),
            Some(auth.user_id),
            layout_id,
            EffectiveRole::Admin,
        )
        .await?;
    }

    let invitation = state
        .store
        .create_invitation(&NewInvitation {
            team_id,
            invited_user_id: input.invited_user_id,
            invited_by: auth.user_id,
            role: input.role,
            layout_id: input.layout_id,
            message: input.message,
        })
        .await?;

    tracing::info!(
        invitation_id = invitation.id,
        team_id,
        invited_user_id = invitation.invited_user_id,
        "Team invitation sent",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: invitation })))
}

/// GET /api/v1/invitations
///
/// Pending invitations addressed to the caller.
pub async fn list_invitations(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let invitations = state.store.pending_invitations(auth.user_id).await?;
    Ok(Json(DataResponse { data: invitations }))
}

/// POST /api/v1/invitations/{id}/respond
///
/// Only the invitee may respond, and only once.
pub async fn respond_invitation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(invitation_id): Path<DbId>,
    Json(input): Json<RespondInvitation>,
) -> AppResult<impl IntoResponse> {
    let invitation = state
        .store
        .respond_invitation(invitation_id, auth.user_id, input.accept)
        .await?;

    tracing::info!(
        invitation_id,
        team_id = invitation.team_id,
        user_id = auth.user_id,
        status = %invitation.status,
        "Team invitation answered",
    );
    Ok(Json(DataResponse { data: invitation }))
}
