//! Request-scoped identity extractors.

pub mod auth;

pub use auth::{OptionalAuth, RequireAuth};
