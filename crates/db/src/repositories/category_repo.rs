//! Repository for the `categories` table.

use layoutsmith_core::types::DbId;
use sqlx::PgPool;

use crate::models::category::{Category, UpdateCategory};
use crate::store::NewLabel;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, color, description, owner_user_id, created_at, updated_at";

/// Provides CRUD operations for per-user categories.
pub struct CategoryRepo;

impl CategoryRepo {
    /// Insert a category. Violates `uq_categories_owner_name` on a duplicate
    /// name for the same owner.
    pub async fn create(pool: &PgPool, input: &NewLabel) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (name, color, description, owner_user_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(&input.name)
            .bind(&input.color)
            .bind(&input.description)
            .bind(input.owner_user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's categories ordered by name.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_user_id: DbId,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM categories WHERE owner_user_id = $1 ORDER BY name, id"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(owner_user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a category. Only non-`None` fields in `input` are applied;
    /// a `Some(None)` description clears it.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, sqlx::Error> {
        let query = format!(
            "UPDATE categories SET \
                 name = COALESCE($2, name), \
                 color = COALESCE($3, color), \
                 description = CASE WHEN $4 THEN $5 ELSE description END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.color)
            .bind(input.description.is_some())
            .bind(input.description.as_ref().and_then(Option::as_deref))
            .fetch_optional(pool)
            .await
    }

    /// Delete a category. Layouts referencing it have `category_id` set to
    /// NULL by the foreign key.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
