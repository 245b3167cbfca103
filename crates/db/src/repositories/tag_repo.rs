//! Repository for the `tags` and `layout_tags` tables.

use layoutsmith_core::types::DbId;
use sqlx::PgPool;

use crate::models::tag::{Tag, UpdateTag};
use crate::store::NewLabel;

/// Column list for `tags` queries.
const TAG_COLUMNS: &str = "id, name, color, description, owner_user_id, created_at, updated_at";

/// Provides CRUD operations for tags and layout-tag associations.
pub struct TagRepo;

impl TagRepo {
    // -----------------------------------------------------------------------
    // Tag CRUD
    // -----------------------------------------------------------------------

    /// Insert a tag. Violates `uq_tags_owner_name` on a duplicate name for
    /// the same owner.
    pub async fn create(pool: &PgPool, input: &NewLabel) -> Result<Tag, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (name, color, description, owner_user_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {TAG_COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(&input.name)
            .bind(&input.color)
            .bind(&input.description)
            .bind(input.owner_user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a tag by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's tags ordered by name.
    pub async fn list_by_owner(pool: &PgPool, owner_user_id: DbId) -> Result<Vec<Tag>, sqlx::Error> {
        let query =
            format!("SELECT {TAG_COLUMNS} FROM tags WHERE owner_user_id = $1 ORDER BY name, id");
        sqlx::query_as::<_, Tag>(&query)
            .bind(owner_user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a tag. Only non-`None` fields in `input` are applied;
    /// a `Some(None)` description clears it.
    ///
    /// Returns `None` if no tag with the given ID exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTag,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "UPDATE tags SET \
                 name = COALESCE($2, name), \
                 color = COALESCE($3, color), \
                 description = CASE WHEN $4 THEN $5 ELSE description END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {TAG_COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.color)
            .bind(input.description.is_some())
            .bind(input.description.as_ref().and_then(Option::as_deref))
            .fetch_optional(pool)
            .await
    }

    /// Delete a tag by ID. Cascade deletes all layout-tag associations.
    ///
    /// Returns `true` if a tag was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Layout-tag associations
    // -----------------------------------------------------------------------

    /// Attach a tag to a layout. Idempotent: does nothing if already attached.
    ///
    /// Returns `true` if a new association was created.
    pub async fn attach(pool: &PgPool, layout_id: DbId, tag_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO layout_tags (layout_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT (layout_id, tag_id) DO NOTHING",
        )
        .bind(layout_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a tag from a layout.
    ///
    /// Returns `true` if an association was removed.
    pub async fn detach(pool: &PgPool, layout_id: DbId, tag_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM layout_tags WHERE layout_id = $1 AND tag_id = $2")
            .bind(layout_id)
            .bind(tag_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All tags attached to a layout, ordered by name.
    pub async fn list_for_layout(pool: &PgPool, layout_id: DbId) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name, t.color, t.description, t.owner_user_id, \
                    t.created_at, t.updated_at \
             FROM tags t \
             JOIN layout_tags lt ON lt.tag_id = t.id \
             WHERE lt.layout_id = $1 \
             ORDER BY t.name, t.id",
        )
        .bind(layout_id)
        .fetch_all(pool)
        .await
    }
}
