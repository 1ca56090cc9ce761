// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Follow graph.
//!
//! An edge is stored on both endpoints (`following` on the actor,
//! `followers` on the target). Both sides are always written in a single
//! transaction via [`Database::update_user_pair`].

use crate::db::Database;
use crate::error::AppError;
use crate::models::{add_to_set, is_valid_id, remove_from_set, FollowStats, User, UserSummary};

#[derive(Clone)]
pub struct GraphService {
    db: Database,
}

impl GraphService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Make `actor_id` follow `target_id`.
    pub async fn follow(&self, actor_id: &str, target_id: &str) -> Result<(), AppError> {
        if actor_id == target_id {
            return Err(AppError::BadRequest("You cannot follow yourself".to_string()));
        }
        ensure_valid(target_id)?;

        self.db
            .update_user_pair(actor_id, target_id, |actor, target| {
                if actor.is_following(&target.id) {
                    return Err(AppError::Conflict(
                        "You are already following this user".to_string(),
                    ));
                }
                add_to_set(&mut actor.following, &target.id);
                add_to_set(&mut target.followers, &actor.id);
                Ok(())
            })
            .await?
            .ok_or_else(user_not_found)?;

        tracing::info!(actor_id, target_id, "User followed");
        Ok(())
    }

    /// Remove the `actor_id` -> `target_id` edge.
    pub async fn unfollow(&self, actor_id: &str, target_id: &str) -> Result<(), AppError> {
        if actor_id == target_id {
            return Err(AppError::BadRequest(
                "You cannot unfollow yourself".to_string(),
            ));
        }
        ensure_valid(target_id)?;

        self.db
            .update_user_pair(actor_id, target_id, |actor, target| {
                if !actor.is_following(&target.id) {
                    return Err(AppError::Conflict(
                        "You are not following this user".to_string(),
                    ));
                }
                remove_from_set(&mut actor.following, &target.id);
                remove_from_set(&mut target.followers, &actor.id);
                Ok(())
            })
            .await?
            .ok_or_else(user_not_found)?;

        tracing::info!(actor_id, target_id, "User unfollowed");
        Ok(())
    }

    pub async fn followers(&self, user_id: &str) -> Result<Vec<UserSummary>, AppError> {
        let user = self.load(user_id).await?;
        self.summaries(&user.followers).await
    }

    pub async fn following(&self, user_id: &str) -> Result<Vec<UserSummary>, AppError> {
        let user = self.load(user_id).await?;
        self.summaries(&user.following).await
    }

    pub async fn stats(&self, user_id: &str) -> Result<FollowStats, AppError> {
        let user = self.load(user_id).await?;
        Ok(FollowStats {
            followers_count: user.followers.len() as u32,
            following_count: user.following.len() as u32,
        })
    }

    async fn load(&self, user_id: &str) -> Result<User, AppError> {
        ensure_valid(user_id)?;
        self.db.get_user(user_id).await?.ok_or_else(user_not_found)
    }

    async fn summaries(&self, ids: &[String]) -> Result<Vec<UserSummary>, AppError> {
        let users = self.db.get_users(ids).await?;
        Ok(users.iter().map(User::summary).collect())
    }
}

fn ensure_valid(user_id: &str) -> Result<(), AppError> {
    if is_valid_id(user_id) {
        Ok(())
    } else {
        Err(user_not_found())
    }
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}
