// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account service: registration, login, profiles, and search.

use crate::db::Database;
use crate::error::AppError;
use crate::models::user::normalize_key;
use crate::models::{is_valid_id, new_id, User, UserSummary};
use crate::services::media::{ImageUpload, MediaFolder, MediaService};
use crate::services::password::PasswordService;
use crate::time_utils::now_rfc3339;
use serde::Deserialize;
use validator::Validate;

/// Registration request body.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile fields to change. `None` leaves a field as is.
#[derive(Debug, Default, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
    pub profile_picture: Option<ImageUpload>,
}

#[derive(Clone)]
pub struct UserService {
    db: Database,
    passwords: PasswordService,
    media: MediaService,
}

impl UserService {
    pub fn new(db: Database, passwords: PasswordService, media: MediaService) -> Self {
        Self {
            db,
            passwords,
            media,
        }
    }

    /// Create an account. Email and username must both be unused.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        let request = RegisterRequest {
            username: request.username.trim().to_string(),
            email: normalize_key(&request.email),
            password: request.password,
        };
        request.validate()?;

        let password_hash = self.passwords.hash_blocking(request.password).await?;

        let user = User {
            id: new_id(),
            username: request.username,
            email: request.email,
            password_hash,
            bio: None,
            profile_picture: None,
            followers: Vec::new(),
            following: Vec::new(),
            created_at: now_rfc3339(),
        };

        self.db.create_user(&user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Check credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, request: LoginRequest) -> Result<User, AppError> {
        request.validate()?;

        let Some(user) = self.db.find_user_by_email(&request.email).await? else {
            tracing::debug!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let matches = self
            .passwords
            .verify_blocking(request.password, user.password_hash.clone())
            .await?;
        if !matches {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Fetch a user; malformed IDs are reported as not found.
    pub async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        if !is_valid_id(user_id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Update the caller's own profile. A new picture is uploaded before
    /// anything is written.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<User, AppError> {
        let update = ProfileUpdate {
            username: update
                .username
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            bio: update.bio.map(|b| b.trim().to_string()),
            profile_picture: update.profile_picture,
        };
        update.validate()?;

        let mut user = self.get_user(user_id).await?;
        let previous_username = user.username.clone();

        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(bio) = update.bio {
            user.bio = if bio.is_empty() { None } else { Some(bio) };
        }
        if let Some(image) = update.profile_picture {
            user.profile_picture = Some(self.media.upload(MediaFolder::Profiles, image).await?);
        }

        self.db.save_profile(&user, &previous_username).await?;
        tracing::info!(user_id = %user.id, "Profile updated");

        Ok(user)
    }

    /// Case-insensitive username substring search.
    pub async fn search(&self, query: &str) -> Result<Vec<UserSummary>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::BadRequest(
                "Query parameter 'username' is required".to_string(),
            ));
        }

        let users = self.db.search_users(query).await?;
        Ok(users.iter().map(User::summary).collect())
    }
}
