//! Handlers for the `/categories` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::organization::{normalize_color, normalize_name, validate_description};
use layoutsmith_core::types::DbId;
use layoutsmith_db::models::category::{Category, CreateCategory, UpdateCategory};
use layoutsmith_db::store::NewLabel;
use layoutsmith_db::{CategoryStore, Store};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a category and require that `owner_user_id` owns it.
pub(crate) async fn ensure_category_usable(
    store: &dyn Store,
    category_id: DbId,
    owner_user_id: DbId,
) -> AppResult<Category> {
    let category = store
        .find_category(category_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: category_id,
        }))?;
    if category.owner_user_id != owner_user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Category belongs to another user".into(),
        )));
    }
    Ok(category)
}

/// Validate a partial update, normalizing whichever fields are present.
fn normalize_update(input: UpdateCategory) -> Result<UpdateCategory, CoreError> {
    let name = input
        .name
        .as_deref()
        .map(|n| normalize_name("Category", n))
        .transpose()?;
    let color = match input.color.as_deref() {
        Some(c) => Some(normalize_color(Some(c))?),
        None => None,
    };
    validate_description(input.description.as_ref().and_then(Option::as_deref))?;

    Ok(UpdateCategory {
        name,
        color,
        description: input.description,
    })
}

/// GET /api/v1/categories
pub async fn list_categories(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let categories = state.store.list_categories(auth.user_id).await?;
    Ok(Json(DataResponse { data: categories }))
}

/// POST /api/v1/categories
///
/// Names are unique per owner. Colour defaults when omitted.
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCategory>,
) -> AppResult<impl IntoResponse> {
    let name = normalize_name("Category", &input.name)?;
    let color = normalize_color(input.color.as_deref())?;
    validate_description(input.description.as_deref())?;

    let category = state
        .store
        .create_category(&NewLabel {
            owner_user_id: auth.user_id,
            name,
            color,
            description: input.description,
        })
        .await?;

    tracing::info!(
        category_id = category.id,
        user_id = auth.user_id,
        "Category created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: category })))
}

/// PUT /api/v1/categories/{id}
pub async fn update_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<impl IntoResponse> {
    let input = normalize_update(input)?;
    ensure_category_usable(state.store.as_ref(), category_id, auth.user_id).await?;

    let category = state
        .store
        .update_category(category_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Category",
            id: category_id,
        }))?;

    tracing::info!(category_id, user_id = auth.user_id, "Category updated");
    Ok(Json(DataResponse { data: category }))
}

/// DELETE /api/v1/categories/{id}
///
/// Layouts filed under the category become uncategorized.
pub async fn delete_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(category_id): Path<DbId>,
) -> AppResult<StatusCode> {
    ensure_category_usable(state.store.as_ref(), category_id, auth.user_id).await?;

    if state.store.delete_category(category_id).await? {
        tracing::info!(category_id, user_id = auth.user_id, "Category deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}
