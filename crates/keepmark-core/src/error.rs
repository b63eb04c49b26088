//! Error types for keepmark.

use thiserror::Error;

/// Result type alias using keepmark's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for keepmark operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Query or connection failure from sqlx
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unique constraint would be violated (duplicate username or email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad credentials, or a missing/invalid/expired token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated (or anonymous) caller does not own the record
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Outbound page fetch failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the database rejected a write because of a unique index.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Fetch(e.to_string())
    }
}
