//! Bearer-token extractors.
//!
//! Identity is handed to handlers as an extractor value:
//!
//! ```rust,ignore
//! async fn list_notes(OptionalAuth(caller): OptionalAuth) { /* caller: Option<Identity> */ }
//! async fn me(RequireAuth(user): RequireAuth) { /* user: Identity */ }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::debug;

use keepmark_core::{Error, Identity};

use crate::error::ApiError;
use crate::services::auth::TOKEN_FAILED;
use crate::state::AppState;

pub const NO_TOKEN: &str = "Not authorized, no token";

enum Bearer {
    Missing,
    Rejected,
    Resolved(Identity),
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve_bearer(parts: &Parts, state: &AppState) -> Result<Bearer, ApiError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(Bearer::Missing);
    };
    match state.auth.identify(token).await {
        Ok(Some(identity)) => Ok(Bearer::Resolved(identity)),
        Ok(None) => {
            debug!(subsystem = "api", component = "auth", "Token names an unknown user");
            Ok(Bearer::Rejected)
        }
        Err(Error::Unauthorized(_)) => Ok(Bearer::Rejected),
        Err(e) => Err(e.into()),
    }
}

/// The caller's identity when a valid token is present, otherwise anonymous.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<Identity>);

#[axum::async_trait]
impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_bearer(parts, state).await? {
            Bearer::Resolved(identity) => Ok(OptionalAuth(Some(identity))),
            Bearer::Missing | Bearer::Rejected => Ok(OptionalAuth(None)),
        }
    }
}

/// Rejects with 401 unless a valid token names an existing user.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_bearer(parts, state).await? {
            Bearer::Resolved(identity) => Ok(RequireAuth(identity)),
            Bearer::Missing => Err(ApiError::Unauthorized(NO_TOKEN.to_string())),
            Bearer::Rejected => Err(ApiError::Unauthorized(TOKEN_FAILED.to_string())),
        }
    }
}
