//! Route definitions for tags. Layout-tag associations are mounted under
//! `/layouts`.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

/// Routes mounted at `/tags`.
///
/// ```text
/// GET    /       -> list_tags
/// POST   /       -> create_tag
/// PUT    /{id}   -> update_tag
/// DELETE /{id}   -> delete_tag
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::list_tags).post(tags::create_tag))
        .route("/{id}", put(tags::update_tag).delete(tags::delete_tag))
}
