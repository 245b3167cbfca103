//! Handlers that call the layout generator: create a root layout, derive an
//! improved version, and ask for recommendations.
//!
//! When the generator is unavailable, generate and improve still persist a
//! layout (a placeholder document, or the parent's code carried forward)
//! and flag the response with `fallback: true`. Recommendations are not
//! persisted, so their failures surface as 502.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::generation::{
    placeholder_markup, GeneratedMarkup, GenerationAction, InputMethod,
};
use layoutsmith_core::roles::EffectiveRole;
use layoutsmith_core::types::DbId;
use layoutsmith_core::versioning::normalize_title;
use layoutsmith_db::models::layout::{GeneratedLayout, NewLayoutVersion, NewRootLayout};
use layoutsmith_db::LayoutStore;
use serde::{Deserialize, Serialize};

use crate::access::require_layout;
use crate::error::{AppError, AppResult};
use crate::generator::{generate_markup, recommend};
use crate::handlers::categories::ensure_category_usable;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /layouts/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(alias = "layout_name")]
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub additional_context: Option<String>,
    #[serde(default)]
    pub input_method: Option<InputMethod>,
    #[serde(default)]
    pub category_id: Option<DbId>,
    #[serde(default)]
    pub is_public: bool,
}

/// Request body for `POST /layouts/{id}/improve`.
///
/// `code` overrides the parent's code as the starting point. Fields left
/// out are inherited from the parent.
#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    pub feedback: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<DbId>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// Request body for `POST /layouts/{id}/recommend`.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// A persisted generation result.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub id: DbId,
    pub html: String,
    pub title: String,
    pub description: String,
    pub version_number: String,
    pub parent_layout_id: Option<DbId>,
    /// `true` when the generator failed and a stand-in was stored.
    pub fallback: bool,
}

impl GenerationResponse {
    fn new(layout: GeneratedLayout, fallback: bool) -> Self {
        Self {
            id: layout.id,
            html: layout.generated_code,
            title: layout.title,
            description: layout.description,
            version_number: layout.version_number,
            parent_layout_id: layout.parent_layout_id,
            fallback,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub layout_id: DbId,
    pub recommendations: Vec<String>,
}

/// Run the generator, substituting `fallback` when it is unavailable.
///
/// Only `DependencyFailure` is absorbed. Validation errors still reach the
/// caller.
async fn markup_or_fallback(
    state: &AppState,
    action: &GenerationAction,
    fallback: impl FnOnce() -> GeneratedMarkup,
) -> AppResult<(GeneratedMarkup, bool)> {
    match generate_markup(state.generator.as_ref(), action).await {
        Ok(markup) => Ok((markup, false)),
        Err(CoreError::DependencyFailure(reason)) => {
            tracing::warn!(action = action.kind(), %reason, "Generator failed, storing fallback");
            Ok((fallback(), true))
        }
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/layouts/generate
///
/// Create a new root layout (`v1.0`). The title is checked for duplicates
/// before the generator is called. The unique index still decides races.
pub async fn generate_layout(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<impl IntoResponse> {
    let title = normalize_title(&input.title)?;

    if state.store.root_title_exists(auth.user_id, &title).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "You already have a layout with this title".into(),
        )));
    }
    if let Some(category_id) = input.category_id {
        ensure_category_usable(state.store.as_ref(), category_id, auth.user_id).await?;
    }

    let input_method = input.input_method.unwrap_or(InputMethod::Text);
    let action = GenerationAction::Generate {
        description: input.description.clone(),
        additional_context: input.additional_context.clone(),
        input_method,
    };
    let (markup, fallback) = markup_or_fallback(&state, &action, || {
        placeholder_markup(&title, &input.description)
    })
    .await?;

    let description = markup
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| input.description.trim().to_string());

    let layout = state
        .store
        .create_root(&NewRootLayout {
            owner_user_id: auth.user_id,
            title,
            description,
            generated_code: markup.html,
            input_method,
            additional_context: input.additional_context,
            category_id: input.category_id,
            is_public: input.is_public,
        })
        .await?;

    tracing::info!(
        layout_id = layout.id,
        user_id = auth.user_id,
        fallback,
        "Root layout generated",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: GenerationResponse::new(layout, fallback),
        }),
    ))
}

/// POST /api/v1/layouts/{id}/improve
///
/// Append a new version to the chain containing `{id}`. Editors may improve
/// a layout but the version stays owned by the layout's owner. Changing
/// visibility on the new version is reserved for the owner.
pub async fn improve_layout(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
    Json(input): Json<ImproveRequest>,
) -> AppResult<impl IntoResponse> {
    let (parent, role) = require_layout(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Editor,
    )
    .await?;

    if input.is_public.is_some() && role != EffectiveRole::Owner {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner can change layout visibility".into(),
        )));
    }
    if let Some(category_id) = input.category_id {
        ensure_category_usable(state.store.as_ref(), category_id, parent.owner_user_id).await?;
    }

    let feedback = input.feedback.trim().to_string();
    let base_code = input.code.unwrap_or(parent.generated_code);
    let action = GenerationAction::Improve {
        code: base_code.clone(),
        feedback: feedback.clone(),
    };
    let (markup, fallback) = markup_or_fallback(&state, &action, || GeneratedMarkup {
        html: base_code,
        title: None,
        description: None,
    })
    .await?;

    let layout = state
        .store
        .create_version(&NewLayoutVersion {
            parent_layout_id: layout_id,
            owner_user_id: parent.owner_user_id,
            generated_code: markup.html,
            changes_description: feedback,
            description: input.description,
            category_id: input.category_id,
            is_public: input.is_public,
        })
        .await?;

    tracing::info!(
        layout_id = layout.id,
        parent_layout_id = layout_id,
        user_id = auth.user_id,
        version = %layout.version_number,
        fallback,
        "Layout version created",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: GenerationResponse::new(layout, fallback),
        }),
    ))
}

/// POST /api/v1/layouts/{id}/recommend
///
/// Suggestions for improving the layout (or the supplied `code`).
pub async fn recommend_improvements(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(layout_id): Path<DbId>,
    Json(input): Json<RecommendRequest>,
) -> AppResult<Json<DataResponse<RecommendResponse>>> {
    let (layout, _) = require_layout(
        state.store.as_ref(),
        Some(auth.user_id),
        layout_id,
        EffectiveRole::Viewer,
    )
    .await?;

    let action = GenerationAction::Recommend {
        code: input.code.unwrap_or(layout.generated_code),
    };
    let recommendations = recommend(state.generator.as_ref(), &action).await?;

    Ok(Json(DataResponse {
        data: RecommendResponse {
            layout_id,
            recommendations,
        },
    }))
}
