//! Registration and login.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use goshop_core::{Email, Role, UserId};

use super::{ApiJson, Message};
use crate::error::{Result, add_breadcrumb};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration form. Missing fields deserialize as empty and are rejected
/// by the service with a field-specific message.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
}

/// Handle registration.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<Message>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let user = auth
        .register(&request.name, &request.email, &request.password)
        .await?;

    add_breadcrumb(
        "auth",
        "User registered",
        Some(&[("user_id", &user.id.to_string())]),
    );

    Ok(Json(Message {
        message: "registration successful",
    }))
}

/// Handle login.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let session = auth
        .login(&request.email, &request.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    tracing::info!(user_id = %session.user.id, role = %session.user.role, "User logged in");

    Ok(Json(LoginResponse {
        token: session.token.token,
        role: session.user.role,
        user_id: session.user.id,
        name: session.user.name,
        email: session.user.email,
    }))
}
