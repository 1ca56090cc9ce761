// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Posts, likes, and comments.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{
    is_valid_id, new_id, Comment, CommentView, LikeAction, Post, PostView, User, UserSummary,
};
use crate::services::media::{ImageUpload, MediaFolder, MediaService};
use crate::time_utils::now_rfc3339;
use std::collections::{HashMap, HashSet};

const MAX_TEXT_LEN: usize = 5000;

#[derive(Clone)]
pub struct PostService {
    db: Database,
    media: MediaService,
}

impl PostService {
    pub fn new(db: Database, media: MediaService) -> Self {
        Self { db, media }
    }

    /// Create a post. Text is required even when an image is attached.
    pub async fn create(
        &self,
        author_id: &str,
        text: &str,
        image: Option<ImageUpload>,
    ) -> Result<PostView, AppError> {
        let text = required_text(text, "Post text")?;

        let image = match image {
            Some(upload) => Some(self.media.upload(MediaFolder::Posts, upload).await?),
            None => None,
        };

        let post = Post {
            id: new_id(),
            user_id: author_id.to_string(),
            text,
            image,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now_rfc3339(),
        };

        self.db.create_post(&post).await?;
        tracing::info!(post_id = %post.id, author_id, has_image = post.image.is_some(), "Post created");

        self.view(&post).await
    }

    /// Every post, newest first.
    pub async fn list_all(&self) -> Result<Vec<PostView>, AppError> {
        let posts = self.db.list_posts().await?;
        self.views(&posts).await
    }

    pub async fn get(&self, post_id: &str) -> Result<PostView, AppError> {
        let post = self.load(post_id).await?;
        self.view(&post).await
    }

    /// Posts by one author, newest first. An author with no posts yields
    /// an empty list; an unknown author is `NotFound`.
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<PostView>, AppError> {
        if !is_valid_id(user_id) || self.db.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let posts = self.db.list_posts_by_user(user_id).await?;
        self.views(&posts).await
    }

    /// Delete a post. Only its author may do so.
    pub async fn delete(&self, requester_id: &str, post_id: &str) -> Result<(), AppError> {
        let post = self.load(post_id).await?;
        if post.user_id != requester_id {
            tracing::warn!(post_id, requester_id, "Rejected delete of another user's post");
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        self.db.delete_post(post_id).await?;
        tracing::info!(post_id, "Post deleted");
        Ok(())
    }

    /// Like or unlike, depending on whether `user_id` already likes the post.
    pub async fn toggle_like(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> Result<(LikeAction, PostView), AppError> {
        ensure_valid(post_id)?;

        let (action, post) = self
            .db
            .update_post(post_id, |post| {
                let action = post.toggle_like(user_id);
                Ok((action, post.clone()))
            })
            .await?
            .ok_or_else(post_not_found)?;

        tracing::debug!(post_id, user_id, ?action, likes = post.likes.len(), "Like toggled");
        Ok((action, self.view(&post).await?))
    }

    /// Append a comment and return the updated post.
    pub async fn add_comment(
        &self,
        user_id: &str,
        post_id: &str,
        text: &str,
    ) -> Result<PostView, AppError> {
        let text = required_text(text, "Comment text")?;
        ensure_valid(post_id)?;

        let comment = Comment {
            id: new_id(),
            user_id: user_id.to_string(),
            text,
            created_at: now_rfc3339(),
        };
        let comment_id = comment.id.clone();

        let post = self
            .db
            .update_post(post_id, |post| {
                post.comments.push(comment.clone());
                Ok(post.clone())
            })
            .await?
            .ok_or_else(post_not_found)?;

        tracing::info!(post_id, comment_id = %comment_id, user_id, "Comment added");
        self.view(&post).await
    }

    /// Comments of a post in insertion order, with authors resolved.
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentView>, AppError> {
        let post = self.load(post_id).await?;
        let authors = self.authors(std::slice::from_ref(&post)).await?;
        Ok(post.comments.iter().map(|c| c.view(&authors)).collect())
    }

    async fn load(&self, post_id: &str) -> Result<Post, AppError> {
        ensure_valid(post_id)?;
        self.db.get_post(post_id).await?.ok_or_else(post_not_found)
    }

    async fn view(&self, post: &Post) -> Result<PostView, AppError> {
        let authors = self.authors(std::slice::from_ref(post)).await?;
        Ok(post.view(&authors))
    }

    async fn views(&self, posts: &[Post]) -> Result<Vec<PostView>, AppError> {
        let authors = self.authors(posts).await?;
        Ok(posts.iter().map(|p| p.view(&authors)).collect())
    }

    /// Summaries of every post and comment author, each fetched once.
    async fn authors(&self, posts: &[Post]) -> Result<HashMap<String, UserSummary>, AppError> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = posts
            .iter()
            .flat_map(|p| {
                std::iter::once(&p.user_id).chain(p.comments.iter().map(|c| &c.user_id))
            })
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let users = self.db.get_users(&ids).await?;
        Ok(users
            .iter()
            .map(|u: &User| (u.id.clone(), u.summary()))
            .collect())
    }
}

fn required_text(text: &str, what: &str) -> Result<String, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", what)));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            what, MAX_TEXT_LEN
        )));
    }
    Ok(text.to_string())
}

fn ensure_valid(post_id: &str) -> Result<(), AppError> {
    if is_valid_id(post_id) {
        Ok(())
    } else {
        Err(post_not_found())
    }
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}
