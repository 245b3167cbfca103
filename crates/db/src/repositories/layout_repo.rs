//! Repository for the `generated_layouts` table.
//!
//! Version chains are walked with recursive CTEs. Appending a version locks
//! the chain root with `SELECT ... FOR UPDATE` so labels are assigned
//! serially per chain.

use layoutsmith_core::error::CoreError;
use layoutsmith_core::search::{LayoutSearch, SearchScope, TagMatch};
use layoutsmith_core::types::DbId;
use layoutsmith_core::versioning::{
    build_history, version_label, MAX_CHAIN_DEPTH, ROOT_VERSION_LABEL,
};
use sqlx::{PgConnection, PgPool};

use crate::error::StoreError;
use crate::models::layout::{GeneratedLayout, LayoutSummary, NewLayoutVersion, NewRootLayout};
use crate::repositories::share_repo::REACHABLE_FOR_USER_CTE;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, generated_code, input_method, \
    additional_context, owner_user_id, category_id, is_public, parent_layout_id, \
    version_number, changes_description, created_at, updated_at";

/// Listing columns (no code body).
const SUMMARY_COLUMNS: &str = "id, title, description, owner_user_id, category_id, \
    is_public, parent_layout_id, version_number, created_at, updated_at";

/// Provides creation, versioning, mutation and search for layouts.
pub struct LayoutRepo;

impl LayoutRepo {
    // ── Creation ─────────────────────────────────────────────────────

    /// Insert a root layout labelled `v1.0`.
    ///
    /// Violates `uq_generated_layouts_owner_root_title` when the owner
    /// already has a root with this title.
    pub async fn create_root(
        pool: &PgPool,
        input: &NewRootLayout,
    ) -> Result<GeneratedLayout, sqlx::Error> {
        let query = format!(
            "INSERT INTO generated_layouts \
                (title, description, generated_code, input_method, additional_context, \
                 owner_user_id, category_id, is_public, version_number) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GeneratedLayout>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.generated_code)
            .bind(input.input_method.as_str())
            .bind(&input.additional_context)
            .bind(input.owner_user_id)
            .bind(input.category_id)
            .bind(input.is_public)
            .bind(ROOT_VERSION_LABEL)
            .fetch_one(pool)
            .await
    }

    /// Append a version below `input.parent_layout_id`.
    ///
    /// Runs in one transaction: lock the chain root, count the non-root
    /// nodes already in the chain, insert with the next label. The child
    /// inherits title, input method and context from its parent, and
    /// description, category and visibility unless overridden.
    pub async fn create_version(
        pool: &PgPool,
        input: &NewLayoutVersion,
    ) -> Result<GeneratedLayout, StoreError> {
        let mut tx = pool.begin().await?;

        let root_id = Self::root_id(&mut *tx, input.parent_layout_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "GeneratedLayout",
                id: input.parent_layout_id,
            })?;

        sqlx::query("SELECT id FROM generated_layouts WHERE id = $1 FOR UPDATE")
            .bind(root_id)
            .execute(&mut *tx)
            .await?;

        let find_parent = format!("SELECT {COLUMNS} FROM generated_layouts WHERE id = $1");
        let parent = sqlx::query_as::<_, GeneratedLayout>(&find_parent)
            .bind(input.parent_layout_id)
            .fetch_one(&mut *tx)
            .await?;

        if parent.owner_user_id != input.owner_user_id {
            return Err(CoreError::Forbidden(format!(
                "Layout {} belongs to another user; versions keep their parent's owner",
                parent.id
            ))
            .into());
        }

        let (existing,): (i64,) = sqlx::query_as(
            "WITH RECURSIVE chain AS ( \
                 SELECT id FROM generated_layouts WHERE id = $1 \
                 UNION \
                 SELECT g.id FROM generated_layouts g JOIN chain c ON g.parent_layout_id = c.id \
             ) \
             SELECT COUNT(*) - 1 FROM chain",
        )
        .bind(root_id)
        .fetch_one(&mut *tx)
        .await?;

        let insert = format!(
            "INSERT INTO generated_layouts \
                (title, description, generated_code, input_method, additional_context, \
                 owner_user_id, category_id, is_public, parent_layout_id, version_number, \
                 changes_description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        let layout = sqlx::query_as::<_, GeneratedLayout>(&insert)
            .bind(&parent.title)
            .bind(input.description.as_ref().unwrap_or(&parent.description))
            .bind(&input.generated_code)
            .bind(parent.input_method.as_str())
            .bind(&parent.additional_context)
            .bind(parent.owner_user_id)
            .bind(input.category_id.or(parent.category_id))
            .bind(input.is_public.unwrap_or(parent.is_public))
            .bind(parent.id)
            .bind(version_label(existing))
            .bind(&input.changes_description)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(layout)
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<GeneratedLayout>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generated_layouts WHERE id = $1");
        sqlx::query_as::<_, GeneratedLayout>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether the owner already has a root layout with exactly this title.
    pub async fn root_title_exists(
        pool: &PgPool,
        owner_user_id: DbId,
        title: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                 SELECT 1 FROM generated_layouts \
                 WHERE owner_user_id = $1 AND title = $2 AND parent_layout_id IS NULL \
             )",
        )
        .bind(owner_user_id)
        .bind(title)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// List an owner's layouts (roots and versions), newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_user_id: DbId,
    ) -> Result<Vec<LayoutSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM generated_layouts \
             WHERE owner_user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, LayoutSummary>(&query)
            .bind(owner_user_id)
            .fetch_all(pool)
            .await
    }

    /// IDs from `layout_id` up to its chain root, starting with `layout_id`.
    ///
    /// Empty when the layout does not exist. Bounded by [`MAX_CHAIN_DEPTH`].
    pub async fn ancestor_ids(
        conn: &mut PgConnection,
        layout_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "WITH RECURSIVE chain AS ( \
                 SELECT id, parent_layout_id, 1 AS depth \
                 FROM generated_layouts WHERE id = $1 \
                 UNION ALL \
                 SELECT g.id, g.parent_layout_id, c.depth + 1 \
                 FROM generated_layouts g \
                 JOIN chain c ON g.id = c.parent_layout_id \
                 WHERE c.depth < $2 \
             ) \
             SELECT id FROM chain ORDER BY depth",
        )
        .bind(layout_id)
        .bind(MAX_CHAIN_DEPTH as i32)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// The root of the chain containing `layout_id`, or `None` if the layout
    /// does not exist.
    async fn root_id(conn: &mut PgConnection, layout_id: DbId) -> Result<Option<DbId>, StoreError> {
        let chain = Self::ancestor_ids(conn, layout_id).await?;
        let Some(&last) = chain.last() else {
            return Ok(None);
        };

        let (parent,): (Option<DbId>,) =
            sqlx::query_as("SELECT parent_layout_id FROM generated_layouts WHERE id = $1")
                .bind(last)
                .fetch_one(&mut *conn)
                .await?;
        if parent.is_some() {
            return Err(CoreError::Internal(format!(
                "Version chain of layout {layout_id} is cyclic or exceeds {MAX_CHAIN_DEPTH} nodes"
            ))
            .into());
        }
        Ok(Some(last))
    }

    /// Every node in the chain containing `layout_id`, newest first.
    ///
    /// The result is the same whichever member of the chain is queried.
    pub async fn version_history(
        pool: &PgPool,
        layout_id: DbId,
    ) -> Result<Vec<LayoutSummary>, StoreError> {
        let mut conn = pool.acquire().await?;
        let root_id = Self::root_id(&mut *conn, layout_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "GeneratedLayout",
                id: layout_id,
            })?;

        let query = format!(
            "WITH RECURSIVE chain AS ( \
                 SELECT id FROM generated_layouts WHERE id = $1 \
                 UNION \
                 SELECT g.id FROM generated_layouts g JOIN chain c ON g.parent_layout_id = c.id \
             ) \
             SELECT {SUMMARY_COLUMNS} FROM generated_layouts \
             WHERE id IN (SELECT id FROM chain)"
        );
        let nodes = sqlx::query_as::<_, LayoutSummary>(&query)
            .bind(root_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(build_history(root_id, nodes))
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Replace the code body in place. This is a draft edit, not a version.
    pub async fn update_code(
        pool: &PgPool,
        id: DbId,
        generated_code: &str,
    ) -> Result<Option<GeneratedLayout>, sqlx::Error> {
        let query = format!(
            "UPDATE generated_layouts SET generated_code = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GeneratedLayout>(&query)
            .bind(id)
            .bind(generated_code)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_visibility(
        pool: &PgPool,
        id: DbId,
        is_public: bool,
    ) -> Result<Option<GeneratedLayout>, sqlx::Error> {
        let query = format!(
            "UPDATE generated_layouts SET is_public = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GeneratedLayout>(&query)
            .bind(id)
            .bind(is_public)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_category(
        pool: &PgPool,
        id: DbId,
        category_id: Option<DbId>,
    ) -> Result<Option<GeneratedLayout>, sqlx::Error> {
        let query = format!(
            "UPDATE generated_layouts SET category_id = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GeneratedLayout>(&query)
            .bind(id)
            .bind(category_id)
            .fetch_optional(pool)
            .await
    }

    // ── Search ───────────────────────────────────────────────────────

    /// Apply a validated search.
    ///
    /// Predicates are conjunctive. The `accessible` scope includes every
    /// version derived from a layout shared with the user.
    pub async fn search(
        pool: &PgPool,
        search: &LayoutSearch,
    ) -> Result<Vec<LayoutSummary>, sqlx::Error> {
        // Build dynamic WHERE clauses.
        let mut conditions = Vec::new();
        let mut bind_idx = 1u32;
        let mut prefix = String::new();

        match search.scope {
            SearchScope::Owned => {
                conditions.push(format!("owner_user_id = ${bind_idx}"));
                bind_idx += 1;
            }
            SearchScope::Accessible => {
                prefix = REACHABLE_FOR_USER_CTE.to_string();
                conditions.push(format!(
                    "(owner_user_id = ${bind_idx} OR id IN (SELECT id FROM reachable))"
                ));
                bind_idx += 1;
            }
            SearchScope::Public => conditions.push("is_public".to_string()),
        }

        if search.category_id.is_some() {
            conditions.push(format!("category_id = ${bind_idx}"));
            bind_idx += 1;
        }
        if !search.tag_ids.is_empty() {
            match search.tag_match {
                TagMatch::All => {
                    conditions.push(format!(
                        "(SELECT COUNT(DISTINCT lt.tag_id) FROM layout_tags lt \
                          WHERE lt.layout_id = generated_layouts.id \
                            AND lt.tag_id = ANY(${bind_idx})) = ${}",
                        bind_idx + 1
                    ));
                    bind_idx += 2;
                }
                TagMatch::Any => {
                    conditions.push(format!(
                        "EXISTS (SELECT 1 FROM layout_tags lt \
                                 WHERE lt.layout_id = generated_layouts.id \
                                   AND lt.tag_id = ANY(${bind_idx}))"
                    ));
                    bind_idx += 1;
                }
            }
        }
        if search.text.is_some() {
            conditions.push(format!(
                "(title ILIKE ${bind_idx} OR description ILIKE ${bind_idx})"
            ));
            bind_idx += 1;
        }
        if search.is_public.is_some() {
            conditions.push(format!("is_public = ${bind_idx}"));
            bind_idx += 1;
        }
        if search.date_from.is_some() {
            conditions.push(format!("created_at >= ${bind_idx}"));
            bind_idx += 1;
        }
        if search.date_to.is_some() {
            conditions.push(format!("created_at <= ${bind_idx}"));
            bind_idx += 1;
        }

        let query = format!(
            "{prefix}SELECT {SUMMARY_COLUMNS} FROM generated_layouts \
             WHERE {conditions} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${next_idx}",
            conditions = conditions.join(" AND "),
            next_idx = bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, LayoutSummary>(&query);

        // Bind dynamic parameters in order.
        if search.scope != SearchScope::Public {
            q = q.bind(search.user_id);
        }
        if let Some(category_id) = search.category_id {
            q = q.bind(category_id);
        }
        if !search.tag_ids.is_empty() {
            q = q.bind(search.tag_ids.clone());
            if search.tag_match == TagMatch::All {
                q = q.bind(search.tag_ids.len() as i64);
            }
        }
        if let Some(pattern) = search.text_pattern() {
            q = q.bind(format!("%{}%", escape_like(&pattern)));
        }
        if let Some(is_public) = search.is_public {
            q = q.bind(is_public);
        }
        if let Some(from) = search.date_from {
            q = q.bind(from);
        }
        if let Some(to) = search.date_to {
            q = q.bind(to);
        }

        q = q.bind(search.limit).bind(search.offset);
        q.fetch_all(pool).await
    }
}

/// Escape `ILIKE` wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("landing"), "landing");
    }
}
