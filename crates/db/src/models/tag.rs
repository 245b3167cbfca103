//! Tag and layout-tag models and DTOs.

use layoutsmith_core::organization::DeleteOutcome;
use layoutsmith_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub owner_user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a tag. `color` defaults when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

/// DTO for updating a tag. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub color: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub description: Option<Option<String>>,
}

/// Response body for `DELETE /tags/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct TagDeleteResult {
    pub tag_id: DbId,
    pub outcome: DeleteOutcome,
}
