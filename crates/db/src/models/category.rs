//! Category entity model and DTOs.

use layoutsmith_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub owner_user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a category. `color` defaults when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

/// DTO for updating a category. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub color: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub description: Option<Option<String>>,
}
