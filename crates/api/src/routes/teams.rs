//! Route definitions for teams and invitations.
//!
//! Two routers are provided:
//! - `router()` for team routes mounted at `/teams`
//! - `invitations_router()` for the invitee's side, mounted at `/invitations`

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::teams;
use crate::state::AppState;

/// Team routes mounted at `/teams`.
///
/// ```text
/// GET    /                          -> list_teams
/// POST   /                          -> create_team
/// GET    /{id}                      -> get_team
/// DELETE /{id}                      -> delete_team (creator)
/// GET    /{id}/members              -> list_members
/// POST   /{id}/members              -> add_member (creator/admin)
/// DELETE /{id}/members/{user_id}    -> remove_member (creator/admin)
/// POST   /{id}/invitations          -> create_invitation (creator/admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(teams::list_teams).post(teams::create_team))
        .route("/{id}", get(teams::get_team).delete(teams::delete_team))
        .route(
            "/{id}/members",
            get(teams::list_members).post(teams::add_member),
        )
        .route("/{id}/members/{user_id}", delete(teams::remove_member))
        .route("/{id}/invitations", post(teams::create_invitation))
}

/// Invitee routes mounted at `/invitations`.
///
/// ```text
/// GET    /                 -> list_invitations
/// POST   /{id}/respond     -> respond_invitation
/// ```
pub fn invitations_router() -> Router<AppState> {
    Router::new()
        .route("/", get(teams::list_invitations))
        .route("/{id}/respond", post(teams::respond_invitation))
}
