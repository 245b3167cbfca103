//! Request handlers.
//!
//! Each submodule serves one resource. Handlers authorize layout access
//! through [`crate::access`], call the store, and map errors via
//! [`crate::error::AppError`].

pub mod auth;
pub mod categories;
pub mod comments;
pub mod generation;
pub mod layouts;
pub mod search;
pub mod sharing;
pub mod tags;
pub mod teams;
