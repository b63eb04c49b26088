use axum::Json;

use crate::envelope::Envelope;
use crate::error::ApiError;

pub async fn health_check() -> Json<Envelope> {
    Json(Envelope::message("Server is running"))
}

pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
