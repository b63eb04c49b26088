use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use keepmark_core::validation::Registration;

use crate::envelope::{created, Envelope};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .auth
        .register(Registration {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(created(session))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .auth
        .login(body.email.as_deref(), body.password.as_deref())
        .await?;
    Ok(Json(Envelope::data(session)))
}

pub async fn me(RequireAuth(user): RequireAuth) -> impl IntoResponse {
    Json(Envelope::data(user))
}
