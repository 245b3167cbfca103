//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. [`crate::PgStore`] delegates to
//! them.

pub mod category_repo;
pub mod comment_repo;
pub mod layout_repo;
pub mod share_repo;
pub mod tag_repo;
pub mod team_repo;
pub mod user_repo;

pub use category_repo::CategoryRepo;
pub use comment_repo::CommentRepo;
pub use layout_repo::LayoutRepo;
pub use share_repo::ShareRepo;
pub use tag_repo::TagRepo;
pub use team_repo::TeamRepo;
pub use user_repo::UserRepo;

/// Wrap a text-column parse failure as a decode error.
pub(crate) fn decode_error(err: layoutsmith_core::error::CoreError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}
