//! HTTP error type.
//!
//! Every failure renders as an envelope with `success: false`. Internal
//! failures always say "Server error"; the underlying message travels in a
//! response extension and is copied into the body's `error` field only when
//! [`expose_error_detail`] is layered on (development).

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::envelope::Envelope;

pub const SERVER_ERROR: &str = "Server error";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    /// Carries the detail that development mode echoes back.
    Internal(String),
}

/// Internal error text attached to 500 responses.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl From<keepmark_core::Error> for ApiError {
    fn from(err: keepmark_core::Error) -> Self {
        use keepmark_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) | Error::Conflict(msg) | Error::Fetch(msg) => {
                ApiError::BadRequest(msg)
            }
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            other @ (Error::Database(_) | Error::Config(_) | Error::Internal(_)) => {
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(detail) => {
                error!(subsystem = "api", error = %detail, "Request failed");
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(Envelope::failure(SERVER_ERROR)),
                )
                    .into_response();
                response.extensions_mut().insert(ErrorDetail(detail));
                return response;
            }
        };

        (status, Json(Envelope::failure(message))).into_response()
    }
}

/// Response mapper that copies [`ErrorDetail`] into the body.
///
/// Layered with `axum::middleware::map_response` in development only.
pub async fn expose_error_detail(response: Response) -> Response {
    match response.extensions().get::<ErrorDetail>().cloned() {
        Some(ErrorDetail(detail)) => {
            let status = response.status();
            (
                status,
                Json(Envelope::failure(SERVER_ERROR).with_error(detail)),
            )
                .into_response()
        }
        None => response,
    }
}
