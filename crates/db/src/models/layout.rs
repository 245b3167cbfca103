//! Generated layout (version-graph node) model and DTOs.

use layoutsmith_core::generation::InputMethod;
use layoutsmith_core::types::{DbId, Timestamp};
use layoutsmith_core::versioning::VersionNode;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `generated_layouts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GeneratedLayout {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub generated_code: String,
    #[sqlx(try_from = "String")]
    pub input_method: InputMethod,
    pub additional_context: Option<String>,
    pub owner_user_id: DbId,
    pub category_id: Option<DbId>,
    pub is_public: bool,
    pub parent_layout_id: Option<DbId>,
    /// Display label (`v1.0`, `v1.1`, ...). Never parsed for ordering.
    pub version_number: String,
    pub changes_description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Layout listing row without the code body.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct LayoutSummary {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub owner_user_id: DbId,
    pub category_id: Option<DbId>,
    pub is_public: bool,
    pub parent_layout_id: Option<DbId>,
    pub version_number: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&GeneratedLayout> for LayoutSummary {
    fn from(layout: &GeneratedLayout) -> Self {
        Self {
            id: layout.id,
            title: layout.title.clone(),
            description: layout.description.clone(),
            owner_user_id: layout.owner_user_id,
            category_id: layout.category_id,
            is_public: layout.is_public,
            parent_layout_id: layout.parent_layout_id,
            version_number: layout.version_number.clone(),
            created_at: layout.created_at,
            updated_at: layout.updated_at,
        }
    }
}

impl VersionNode for LayoutSummary {
    fn node_id(&self) -> DbId {
        self.id
    }

    fn parent_id(&self) -> Option<DbId> {
        self.parent_layout_id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Insert payload for a root layout. The title is already normalised.
#[derive(Debug, Clone)]
pub struct NewRootLayout {
    pub owner_user_id: DbId,
    pub title: String,
    pub description: String,
    pub generated_code: String,
    pub input_method: InputMethod,
    pub additional_context: Option<String>,
    pub category_id: Option<DbId>,
    pub is_public: bool,
}

/// Insert payload for a version derived from `parent_layout_id`.
///
/// `None` override fields inherit the parent's value.
#[derive(Debug, Clone)]
pub struct NewLayoutVersion {
    pub parent_layout_id: DbId,
    pub owner_user_id: DbId,
    pub generated_code: String,
    pub changes_description: String,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    pub is_public: Option<bool>,
}

/// Request body for `PUT /layouts/{id}/code`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLayoutCode {
    pub generated_code: String,
}

/// Request body for `PUT /layouts/{id}/visibility`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateVisibility {
    pub is_public: bool,
}

/// Request body for `PUT /layouts/{id}/category`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLayoutCategory {
    pub category_id: Option<DbId>,
}
