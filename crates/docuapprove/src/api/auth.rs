//! Login, logout and identity handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::context::AppState;
use super::error::ApiError;
use super::extractors::{ApiJson, AuthUser};
use crate::auth::{Identity, Session};

/// Body of `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Exchange credentials for a bearer token.
#[tracing::instrument(skip_all, fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state.sessions.login(&request.email, &request.password)?;
    Ok(Json(session))
}

/// Revoke the presented token.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    state.sessions.logout(&user.token)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's identity.
pub async fn me(user: AuthUser) -> Json<Identity> {
    Json(user.identity)
}
