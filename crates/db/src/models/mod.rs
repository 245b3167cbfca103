//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create/update DTOs for request payloads

pub mod category;
pub mod comment;
pub mod layout;
pub mod share;
pub mod tag;
pub mod team;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserialize a nullable field that may also be omitted.
///
/// Paired with `#[serde(default)]`: an absent key stays `None`, an explicit
/// `null` becomes `Some(None)`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
