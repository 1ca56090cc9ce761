// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post and comment models for storage and API.

use crate::models::UserSummary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Post document stored in the `posts` collection.
///
/// Comments are embedded and go away with the post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// UUID (also used as document ID)
    pub id: String,
    /// Author's user ID, never changes
    pub user_id: String,
    pub text: String,
    /// Media host URL
    #[serde(default)]
    pub image: Option<String>,
    /// IDs of users who liked the post
    #[serde(default)]
    pub likes: Vec<String>,
    /// In insertion order
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// RFC3339, millisecond precision
    pub created_at: String,
}

/// Comment embedded in a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: String,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum LikeAction {
    Liked,
    Unliked,
}

impl Post {
    /// Flip `user_id`'s membership in the like set.
    pub fn toggle_like(&mut self, user_id: &str) -> LikeAction {
        if let Some(pos) = self.likes.iter().position(|id| id == user_id) {
            self.likes.remove(pos);
            LikeAction::Unliked
        } else {
            self.likes.push(user_id.to_string());
            LikeAction::Liked
        }
    }

    /// API view of the post, with the author resolved from `authors` when present.
    pub fn view(&self, authors: &HashMap<String, UserSummary>) -> PostView {
        PostView {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            author: authors.get(&self.user_id).cloned(),
            text: self.text.clone(),
            image: self.image.clone(),
            likes: self.likes.clone(),
            comments: self
                .comments
                .iter()
                .map(|c| c.view(authors))
                .collect(),
            created_at: self.created_at.clone(),
        }
    }
}

impl Comment {
    pub fn view(&self, authors: &HashMap<String, UserSummary>) -> CommentView {
        CommentView {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            user: authors.get(&self.user_id).cloned(),
            text: self.text.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// Post as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PostView {
    pub id: String,
    pub user_id: String,
    /// `None` when the author could not be resolved
    pub author: Option<UserSummary>,
    pub text: String,
    pub image: Option<String>,
    pub likes: Vec<String>,
    pub comments: Vec<CommentView>,
    pub created_at: String,
}

/// Comment as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CommentView {
    pub id: String,
    pub user_id: String,
    pub user: Option<UserSummary>,
    pub text: String,
    pub created_at: String,
}
