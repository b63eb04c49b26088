//! Service layer for business logic.

pub mod auth;
pub mod title_resolver;

pub use auth::{AuthService, AuthSession};
pub use title_resolver::{HttpTitleResolver, TitleResolver};
