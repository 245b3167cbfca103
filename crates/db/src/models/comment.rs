//! Layout comment model and DTOs.

use layoutsmith_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `layout_comments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LayoutComment {
    pub id: DbId,
    pub layout_id: DbId,
    pub user_id: DbId,
    pub comment: String,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub resolved: bool,
    pub created_at: Timestamp,
}

/// Request body for `POST /layouts/{id}/comments`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub comment: String,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
}

/// Insert payload for a comment, after access checks.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub layout_id: DbId,
    pub user_id: DbId,
    pub comment: String,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
}
