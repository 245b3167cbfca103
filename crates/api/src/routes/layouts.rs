//! Route definitions for layouts and their sub-resources.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{comments, generation, layouts, search, sharing};
use crate::state::AppState;

/// Routes mounted at `/layouts`.
///
/// `/search` and `/generate` are static segments and win over `/{id}`.
///
/// ```text
/// GET    /                          -> list_layouts
/// GET    /search                    -> search_layouts
/// POST   /generate                  -> generate_layout
/// GET    /{id}                      -> get_layout
/// PUT    /{id}/code                 -> update_code
/// PUT    /{id}/visibility           -> update_visibility (owner)
/// PUT    /{id}/category             -> update_category
/// GET    /{id}/versions             -> version_history
/// POST   /{id}/improve              -> improve_layout
/// POST   /{id}/recommend            -> recommend_improvements
/// GET    /{id}/tags                 -> list_layout_tags
/// POST   /{id}/tags/{tag_id}        -> attach_tag
/// DELETE /{id}/tags/{tag_id}        -> detach_tag
/// GET    /{id}/shares               -> list_shares
/// POST   /{id}/shares               -> create_share
/// DELETE /{id}/shares/{share_id}    -> delete_share
/// GET    /{id}/comments             -> list_comments
/// POST   /{id}/comments             -> add_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(layouts::list_layouts))
        .route("/search", get(search::search_layouts))
        .route("/generate", post(generation::generate_layout))
        .route("/{id}", get(layouts::get_layout))
        .route("/{id}/code", put(layouts::update_code))
        .route("/{id}/visibility", put(layouts::update_visibility))
        .route("/{id}/category", put(layouts::update_category))
        .route("/{id}/versions", get(layouts::version_history))
        .route("/{id}/improve", post(generation::improve_layout))
        .route("/{id}/recommend", post(generation::recommend_improvements))
        .route("/{id}/tags", get(layouts::list_layout_tags))
        .route(
            "/{id}/tags/{tag_id}",
            post(layouts::attach_tag).delete(layouts::detach_tag),
        )
        .route(
            "/{id}/shares",
            get(sharing::list_shares).post(sharing::create_share),
        )
        .route("/{id}/shares/{share_id}", delete(sharing::delete_share))
        .route(
            "/{id}/comments",
            get(comments::list_comments).post(comments::add_comment),
        )
}
