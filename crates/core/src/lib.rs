//! Domain logic for the layout versioning and collaboration service.
//!
//! Nothing in this crate performs I/O. The storage layer (`layoutsmith-db`)
//! and the HTTP layer (`layoutsmith-api`) both build on these types so the
//! permission ordering, version labelling and invitation rules live in
//! exactly one place.

#[macro_use]
mod text_enum;

pub mod access;
pub mod error;
pub mod generation;
pub mod invitation;
pub mod organization;
pub mod roles;
pub mod search;
pub mod types;
pub mod versioning;
