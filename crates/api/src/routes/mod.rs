pub mod auth;
pub mod categories;
pub mod comments;
pub mod health;
pub mod layouts;
pub mod tags;
pub mod teams;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/me                                         current user
///
/// /layouts                                         own layouts
/// /layouts/search                                  filtered search
/// /layouts/generate                                new root layout (POST)
/// /layouts/{id}                                    get (public layouts readable anonymously)
/// /layouts/{id}/code                               draft edit (PUT)
/// /layouts/{id}/visibility                         toggle public flag (PUT, owner)
/// /layouts/{id}/category                           assign category (PUT)
/// /layouts/{id}/versions                           version history
/// /layouts/{id}/improve                            new version (POST)
/// /layouts/{id}/recommend                          suggestions (POST)
/// /layouts/{id}/tags                               list tags
/// /layouts/{id}/tags/{tag_id}                      attach, detach
/// /layouts/{id}/shares                             list, create
/// /layouts/{id}/shares/{share_id}                  revoke
/// /layouts/{id}/comments                           list, add
///
/// /comments/{id}/resolve                           resolve (POST)
///
/// /categories                                      list, create
/// /categories/{id}                                 update, delete
///
/// /tags                                            list, create
/// /tags/{id}                                       update, delete
///
/// /teams                                           list, create
/// /teams/{id}                                      get, delete
/// /teams/{id}/members                              list, add
/// /teams/{id}/members/{user_id}                    remove
/// /teams/{id}/invitations                          invite (POST)
///
/// /invitations                                     my pending invitations
/// /invitations/{id}/respond                        accept or reject (POST)
///
/// /shared-with-me                                  layouts shared with me
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/layouts", layouts::router())
        .nest("/comments", comments::router())
        .nest("/categories", categories::router())
        .nest("/tags", tags::router())
        .nest("/teams", teams::router())
        .nest("/invitations", teams::invitations_router())
        .route("/shared-with-me", get(handlers::sharing::shared_with_me))
}
