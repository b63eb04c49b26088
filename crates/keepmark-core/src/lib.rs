//! # keepmark-core
//!
//! Core types, traits, and abstractions for keepmark.
//!
//! This crate provides the domain records (users, notes, bookmarks), the
//! field validation rules, the shared ownership check, and the repository
//! traits that storage backends implement.

pub mod error;
pub mod models;
pub mod ownership;
pub mod traits;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use ownership::{can_access, ensure_access, Access, Owned};
pub use traits::*;
