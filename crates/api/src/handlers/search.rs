//! Layout search.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use layoutsmith_db::LayoutStore;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/layouts/search
///
/// Filters are combined with AND. `scope` picks the candidate set: the
/// caller's layouts (default), everything the caller can read, or all
/// public layouts.
pub async fn search_layouts(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let search = params.into_search(auth.user_id)?;
    let layouts = state.store.search_layouts(&search).await?;

    tracing::debug!(
        user_id = auth.user_id,
        scope = %search.scope,
        results = layouts.len(),
        "Layout search",
    );
    Ok(Json(DataResponse { data: layouts }))
}
