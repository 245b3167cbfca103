//! Request extractors for caller identity.
//!
//! - [`auth::AuthUser`] -- requires a valid JWT Bearer token.
//! - [`auth::MaybeAuthUser`] -- accepts anonymous callers.

pub mod auth;
