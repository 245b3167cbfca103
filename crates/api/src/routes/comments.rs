//! Route definitions for comment actions not scoped under a layout.

use axum::routing::post;
use axum::Router;

use crate::handlers::comments;
use crate::state::AppState;

/// Routes mounted at `/comments`.
///
/// ```text
/// POST   /{id}/resolve   -> resolve_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/resolve", post(comments::resolve_comment))
}
