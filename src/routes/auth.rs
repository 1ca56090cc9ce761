// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login, and session routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{User, UserProfile};
use crate::routes::form::json_body;
use crate::services::users::{LoginRequest, RegisterRequest};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Routes reachable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

/// Routes that need a session (auth middleware applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/me", get(get_me))
}

/// User fields returned alongside a fresh token.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub message: String,
    pub token: String,
    pub user: SessionUser,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn session(user: &User, signing_key: &[u8], message: &str) -> Result<SessionResponse> {
    let token = create_jwt(&user.id, signing_key)?;

    Ok(SessionResponse {
        message: message.to_string(),
        token,
        user: SessionUser {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        },
    })
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let request = json_body(payload)?;
    let user = state.users.register(request).await?;

    let response = session(
        &user,
        &state.config.jwt_signing_key,
        "User registered successfully",
    )?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>> {
    let request = json_body(payload)?;
    let user = state.users.authenticate(request).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(session(
        &user,
        &state.config.jwt_signing_key,
        "Login successful",
    )?))
}

/// Tokens are not tracked server-side; the client discards its copy.
async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// The caller's own profile.
pub(crate) async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state.users.get_user(&user.user_id).await.map_err(|e| match e {
        // Token outlived its account
        AppError::NotFound(_) => AppError::NotFound(format!("User {} not found", user.user_id)),
        other => other,
    })?;

    Ok(Json(profile.profile()))
}
