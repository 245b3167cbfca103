use layoutsmith_core::error::CoreError;
use layoutsmith_core::types::DbId;

/// Errors raised by storage backends.
///
/// Both backends report uniqueness violations as [`StoreError::Duplicate`]
/// carrying the PostgreSQL constraint name, so callers can map them the same
/// way regardless of backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate value violates {constraint}")]
    Duplicate { constraint: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A domain rule rejected an operation that had to be checked inside a
    /// transaction (e.g. responding to an invitation).
    #[error(transparent)]
    Rule(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn duplicate(constraint: &str) -> Self {
        StoreError::Duplicate {
            constraint: constraint.to_string(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                if let Some(constraint) = db_err.constraint() {
                    return StoreError::duplicate(constraint);
                }
            }
        }
        StoreError::Database(err)
    }
}
