// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post, like, and comment routes (all require authentication).

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{CommentView, LikeAction, PostView};
use crate::routes::auth::MessageResponse;
use crate::routes::form::{json_body, read_form};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/posts", post(create_post).get(list_posts))
        .route("/api/posts/{id}", get(get_post).delete(delete_post))
        .route("/api/posts/user/{user_id}", get(list_user_posts))
        .route("/api/posts/like/{id}", put(toggle_like))
        .route(
            "/api/posts/{id}/comments",
            post(add_comment).get(list_comments),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PostResponse {
    pub message: String,
    pub post: PostView,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikeResponse {
    pub message: String,
    pub action: LikeAction,
    pub likes: Vec<String>,
    pub post: PostView,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

/// Create a post from a multipart form (`text`, optional `image`).
async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let mut form = read_form(multipart, "image").await?;
    let text = form.take_text("text").unwrap_or_default();

    let post = state.posts.create(&user.user_id, &text, form.image).await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "Post created successfully".to_string(),
            post,
        }),
    ))
}

async fn list_posts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PostView>>> {
    Ok(Json(state.posts.list_all().await?))
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PostView>> {
    Ok(Json(state.posts.get(&id).await?))
}

async fn list_user_posts(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PostView>>> {
    Ok(Json(state.posts.list_by_user(&user_id).await?))
}

async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let (action, post) = state.posts.toggle_like(&user.user_id, &id).await?;

    let message = match action {
        LikeAction::Liked => "Post liked",
        LikeAction::Unliked => "Post unliked",
    };

    Ok(Json(LikeResponse {
        message: message.to_string(),
        action,
        likes: post.likes.clone(),
        post,
    }))
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.posts.delete(&user.user_id, &id).await?;

    Ok(Json(MessageResponse {
        message: "Post deleted successfully".to_string(),
    }))
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let request = json_body(payload)?;
    let post = state
        .posts
        .add_comment(&user.user_id, &id, &request.text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: "Comment added successfully".to_string(),
            post,
        }),
    ))
}

async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CommentView>>> {
    Ok(Json(state.posts.list_comments(&id).await?))
}
