//! Repository for the `layout_comments` table.

use layoutsmith_core::types::DbId;
use sqlx::PgPool;

use crate::models::comment::{LayoutComment, NewComment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, layout_id, user_id, comment, position_x, position_y, resolved, created_at";

/// Provides append and resolve operations for layout comments.
pub struct CommentRepo;

impl CommentRepo {
    pub async fn create(pool: &PgPool, input: &NewComment) -> Result<LayoutComment, sqlx::Error> {
        let query = format!(
            "INSERT INTO layout_comments (layout_id, user_id, comment, position_x, position_y) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LayoutComment>(&query)
            .bind(input.layout_id)
            .bind(input.user_id)
            .bind(&input.comment)
            .bind(input.position_x)
            .bind(input.position_y)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<LayoutComment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM layout_comments WHERE id = $1");
        sqlx::query_as::<_, LayoutComment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a layout's comments, oldest first.
    pub async fn list_for_layout(
        pool: &PgPool,
        layout_id: DbId,
    ) -> Result<Vec<LayoutComment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM layout_comments \
             WHERE layout_id = $1 \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, LayoutComment>(&query)
            .bind(layout_id)
            .fetch_all(pool)
            .await
    }

    /// Mark a comment resolved. There is no way back to unresolved.
    pub async fn resolve(pool: &PgPool, id: DbId) -> Result<Option<LayoutComment>, sqlx::Error> {
        let query = format!(
            "UPDATE layout_comments SET resolved = TRUE WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LayoutComment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
