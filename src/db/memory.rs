// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Mirrors the Firestore backend's semantics (create-if-absent claims,
//! all-or-nothing pair and post updates) for local development and tests.

use crate::db::username_matches;
use crate::error::AppError;
use crate::models::user::normalize_key;
use crate::models::{Post, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Collections {
    users: DashMap<String, User>,
    posts: DashMap<String, Post>,
    /// normalized email -> user ID
    emails: DashMap<String, String>,
    /// normalized username -> user ID
    usernames: DashMap<String, String>,
    /// Serializes user writes so pair updates and profile saves never
    /// interleave.
    user_writes: Mutex<()>,
    /// Serializes post read-modify-write cycles.
    post_writes: Mutex<()>,
}

/// In-memory database. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Collections>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `key` in `claims`, failing with `Conflict` if present.
    fn insert_claim(
        claims: &DashMap<String, String>,
        value: &str,
        user_id: &str,
        conflict_message: &str,
    ) -> Result<(), AppError> {
        match claims.entry(normalize_key(value)) {
            Entry::Occupied(_) => Err(AppError::Conflict(conflict_message.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user_id.to_string());
                Ok(())
            }
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let _guard = self.inner.user_writes.lock().await;

        Self::insert_claim(
            &self.inner.emails,
            &user.email,
            &user.id,
            "Email already exists",
        )?;
        if let Err(e) = Self::insert_claim(
            &self.inner.usernames,
            &user.username,
            &user.id,
            "Username already taken",
        ) {
            self.inner.emails.remove(&normalize_key(&user.email));
            return Err(e);
        }

        self.inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.users.get(user_id).map(|u| u.clone()))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user_id = self
            .inner
            .emails
            .get(&normalize_key(email))
            .map(|id| id.clone());

        match user_id {
            Some(id) => self.get_user(&id).await,
            None => Ok(None),
        }
    }

    pub async fn save_profile(&self, user: &User, previous_username: &str) -> Result<(), AppError> {
        let _guard = self.inner.user_writes.lock().await;

        if !self.inner.users.contains_key(&user.id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let renamed = normalize_key(&user.username) != normalize_key(previous_username);
        if renamed {
            Self::insert_claim(
                &self.inner.usernames,
                &user.username,
                &user.id,
                "Username already taken",
            )?;
            self.inner.usernames.remove(&normalize_key(previous_username));
        }

        if let Some(mut stored) = self.inner.users.get_mut(&user.id) {
            stored.username = user.username.clone();
            stored.bio = user.bio.clone();
            stored.profile_picture = user.profile_picture.clone();
        }
        Ok(())
    }

    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, AppError> {
        let needle = query.to_lowercase();
        let mut users: Vec<User> = self
            .inner
            .users
            .iter()
            .filter(|u| username_matches(&u.username, &needle))
            .map(|u| u.clone())
            .collect();

        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    pub async fn update_user_pair<T, F>(
        &self,
        first_id: &str,
        second_id: &str,
        mut f: F,
    ) -> Result<Option<T>, AppError>
    where
        F: FnMut(&mut User, &mut User) -> Result<T, AppError> + Send,
        T: Send,
    {
        if first_id == second_id {
            return Err(AppError::BadRequest(
                "Pair update requires two distinct users".to_string(),
            ));
        }

        let _guard = self.inner.user_writes.lock().await;

        let first = self.inner.users.get(first_id).map(|u| u.clone());
        let second = self.inner.users.get(second_id).map(|u| u.clone());
        let (Some(mut first), Some(mut second)) = (first, second) else {
            return Ok(None);
        };

        let output = f(&mut first, &mut second)?;

        self.inner.users.insert(first.id.clone(), first);
        self.inner.users.insert(second.id.clone(), second);
        Ok(Some(output))
    }

    // ─── Post Operations ─────────────────────────────────────────

    pub async fn create_post(&self, post: &Post) -> Result<(), AppError> {
        self.inner.posts.insert(post.id.clone(), post.clone());
        Ok(())
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        Ok(self.inner.posts.get(post_id).map(|p| p.clone()))
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        Ok(newest_first(
            self.inner.posts.iter().map(|p| p.clone()).collect(),
        ))
    }

    pub async fn list_posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, AppError> {
        Ok(newest_first(
            self.inner
                .posts
                .iter()
                .filter(|p| p.user_id == user_id)
                .map(|p| p.clone())
                .collect(),
        ))
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        let _guard = self.inner.post_writes.lock().await;
        self.inner.posts.remove(post_id);
        Ok(())
    }

    pub async fn update_post<T, F>(&self, post_id: &str, mut f: F) -> Result<Option<T>, AppError>
    where
        F: FnMut(&mut Post) -> Result<T, AppError> + Send,
        T: Send,
    {
        let _guard = self.inner.post_writes.lock().await;

        let Some(mut post) = self.inner.posts.get(post_id).map(|p| p.clone()) else {
            return Ok(None);
        };

        let output = f(&mut post)?;
        self.inner.posts.insert(post.id.clone(), post);
        Ok(Some(output))
    }
}

fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}
