// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile, search, and follow-graph routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{FollowStats, UserProfile, UserSummary};
use crate::routes::auth::{get_me, MessageResponse};
use crate::routes::form::read_form;
use crate::services::users::ProfileUpdate;
use crate::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Routes reachable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/search", get(search_users))
        .route("/api/users/{id}/follow-stats", get(follow_stats))
}

/// Routes that need a session (auth middleware applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/me", get(get_me))
        .route("/api/users/update", put(update_profile))
        .route("/api/users/follow/{id}", put(follow))
        .route("/api/users/unfollow/{id}", put(unfollow))
        .route("/api/users/{id}", get(get_user))
        .route("/api/users/{id}/followers", get(followers))
        .route("/api/users/{id}/following", get(following))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    username: String,
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.users.get_user(&id).await?.profile()))
}

/// Update the caller's profile from a multipart form (`username`, `bio`,
/// optional `profilePicture`).
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<ProfileResponse>> {
    let mut form = read_form(multipart, "profilePicture").await?;

    let update = ProfileUpdate {
        username: form.take_text("username"),
        bio: form.take_text("bio"),
        profile_picture: form.image.take(),
    };
    let updated = state.users.update_profile(&user.user_id, update).await?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: updated.profile(),
    }))
}

async fn follow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.graph.follow(&user.user_id, &id).await?;

    Ok(Json(MessageResponse {
        message: "User followed successfully".to_string(),
    }))
}

async fn unfollow(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.graph.unfollow(&user.user_id, &id).await?;

    Ok(Json(MessageResponse {
        message: "User unfollowed successfully".to_string(),
    }))
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSummary>>> {
    Ok(Json(state.users.search(&query.username).await?))
}

async fn followers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<UserSummary>>> {
    Ok(Json(state.graph.followers(&id).await?))
}

async fn following(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<UserSummary>>> {
    Ok(Json(state.graph.following(&id).await?))
}

async fn follow_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FollowStats>> {
    Ok(Json(state.graph.stats(&id).await?))
}
