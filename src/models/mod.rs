// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod post;
pub mod user;

pub use post::{Comment, CommentView, LikeAction, Post, PostView};
pub use user::{FollowStats, UniqueClaim, User, UserProfile, UserSummary};

/// Returns true if `id` is a structurally valid identifier (UUID).
///
/// Checked before any lookup so malformed IDs never reach the store.
pub fn is_valid_id(id: &str) -> bool {
    uuid::Uuid::parse_str(id).is_ok()
}

/// Generate a fresh identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Insert `value` unless already present (set semantics over a `Vec`).
pub fn add_to_set(set: &mut Vec<String>, value: &str) -> bool {
    if set.iter().any(|v| v == value) {
        return false;
    }
    set.push(value.to_string());
    true
}

/// Remove every occurrence of `value`.
pub fn remove_from_set(set: &mut Vec<String>, value: &str) -> bool {
    let before = set.len();
    set.retain(|v| v != value);
    set.len() != before
}
