// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Database`] dispatches to Firestore in production or to an in-process
//! store for local development and tests. Both backends expose the same
//! operations, including the two transactional read-modify-write helpers
//! ([`Database::update_user_pair`] and [`Database::update_post`]).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Post, User};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const POSTS: &str = "posts";
    /// Email uniqueness claims (keyed by normalized email)
    pub const USER_EMAILS: &str = "user_emails";
    /// Username uniqueness claims (keyed by normalized username)
    pub const USER_NAMES: &str = "user_names";
}

/// Username search predicate shared by both backends. `needle` must
/// already be lower-cased.
pub(crate) fn username_matches(username: &str, needle: &str) -> bool {
    username.to_lowercase().contains(needle)
}

/// Document store handle shared by all services.
#[derive(Clone)]
pub enum Database {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Database {
    // ─── User Operations ─────────────────────────────────────────

    /// Create a user, reserving its email and username.
    ///
    /// Fails with `Conflict` if either is already taken. Uniqueness is
    /// enforced by the store, not by a read-then-write check.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.create_user(user).await,
            Database::Memory(db) => db.create_user(user).await,
        }
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match self {
            Database::Firestore(db) => db.get_user(user_id).await,
            Database::Memory(db) => db.get_user(user_id).await,
        }
    }

    /// Get several users, preserving the order of `user_ids` and skipping
    /// IDs that no longer resolve.
    pub async fn get_users(&self, user_ids: &[String]) -> Result<Vec<User>, AppError> {
        let users = stream::iter(user_ids.to_vec())
            .map(|id| async move { self.get_user(&id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<User>>, AppError>>()?;

        Ok(users.into_iter().flatten().collect())
    }

    /// Look a user up by (normalized) email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match self {
            Database::Firestore(db) => db.find_user_by_email(email).await,
            Database::Memory(db) => db.find_user_by_email(email).await,
        }
    }

    /// Persist profile fields (username, bio, profile picture).
    ///
    /// When the username changed, the new name is claimed first (`Conflict`
    /// if taken) and the old claim is released afterwards. Follow lists are
    /// left untouched.
    pub async fn save_profile(&self, user: &User, previous_username: &str) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.save_profile(user, previous_username).await,
            Database::Memory(db) => db.save_profile(user, previous_username).await,
        }
    }

    /// Users whose username contains `query`, case-insensitively.
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, AppError> {
        match self {
            Database::Firestore(db) => db.search_users(query).await,
            Database::Memory(db) => db.search_users(query).await,
        }
    }

    /// Atomically read two distinct users, apply `f`, and write both back.
    ///
    /// Returns `Ok(None)` without writing if either user does not exist.
    /// If `f` fails nothing is written. `f` may run more than once when a
    /// concurrent writer forces a retry, so it must only touch its arguments.
    pub async fn update_user_pair<T, F>(
        &self,
        first_id: &str,
        second_id: &str,
        f: F,
    ) -> Result<Option<T>, AppError>
    where
        F: FnMut(&mut User, &mut User) -> Result<T, AppError> + Send,
        T: Send,
    {
        match self {
            Database::Firestore(db) => db.update_user_pair(first_id, second_id, f).await,
            Database::Memory(db) => db.update_user_pair(first_id, second_id, f).await,
        }
    }

    // ─── Post Operations ─────────────────────────────────────────

    /// Store a new post.
    pub async fn create_post(&self, post: &Post) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.create_post(post).await,
            Database::Memory(db) => db.create_post(post).await,
        }
    }

    /// Get a post by ID.
    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        match self {
            Database::Firestore(db) => db.get_post(post_id).await,
            Database::Memory(db) => db.get_post(post_id).await,
        }
    }

    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        match self {
            Database::Firestore(db) => db.list_posts().await,
            Database::Memory(db) => db.list_posts().await,
        }
    }

    /// Posts by one author, newest first.
    pub async fn list_posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, AppError> {
        match self {
            Database::Firestore(db) => db.list_posts_by_user(user_id).await,
            Database::Memory(db) => db.list_posts_by_user(user_id).await,
        }
    }

    /// Hard-delete a post together with its embedded comments.
    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.delete_post(post_id).await,
            Database::Memory(db) => db.delete_post(post_id).await,
        }
    }

    /// Atomically read a post, apply `f`, and write it back.
    ///
    /// Returns `Ok(None)` if the post does not exist or is deleted before
    /// the write commits. If `f` fails nothing is written. Like
    /// [`Database::update_user_pair`], `f` may be retried.
    pub async fn update_post<T, F>(&self, post_id: &str, f: F) -> Result<Option<T>, AppError>
    where
        F: FnMut(&mut Post) -> Result<T, AppError> + Send,
        T: Send,
    {
        match self {
            Database::Firestore(db) => db.update_post(post_id, f).await,
            Database::Memory(db) => db.update_post(post_id, f).await,
        }
    }
}
