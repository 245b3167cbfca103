//! Persistence for layouts, organization data, teams and shares.
//!
//! Two interchangeable backends implement the [`Store`] capability set:
//! [`PgStore`] over a PostgreSQL pool and [`MemoryStore`] for tests and
//! local development. The backend is chosen once at process start.

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod models;
pub mod repositories;
pub mod store;

pub use error::StoreError;
pub use store::memory::MemoryStore;
pub use store::postgres::PgStore;
pub use store::{
    CategoryStore, CommentStore, LayoutStore, ShareStore, StorageHealth, Store, TagStore,
    TeamStore, UserStore,
};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations under `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
