// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User record stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// UUID (also used as document ID)
    pub id: String,
    /// Display name, unique case-insensitively
    pub username: String,
    /// Login email, stored lower-cased
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Media host URL of the profile picture
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// IDs of users following this user
    #[serde(default)]
    pub followers: Vec<String>,
    /// IDs of users this user follows
    #[serde(default)]
    pub following: Vec<String>,
    /// When the account was created (RFC3339)
    pub created_at: String,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
            profile_picture: self.profile_picture.clone(),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            profile_picture: self.profile_picture.clone(),
            followers: self.followers.clone(),
            following: self.following.clone(),
            created_at: self.created_at.clone(),
        }
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.following.iter().any(|id| id == user_id)
    }
}

/// Reduced view of a user embedded in other responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub profile_picture: Option<String>,
}

/// Full user record as returned by the API (never carries the password hash).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub created_at: String,
}

/// Follower/following counts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FollowStats {
    pub followers_count: u32,
    pub following_count: u32,
}

/// Storage record reserving a unique value (email or username).
///
/// Document ID is the URL-encoded, lower-cased value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueClaim {
    pub user_id: String,
}

/// Normalize an email or username for uniqueness checks.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            username: "Alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            bio: None,
            profile_picture: Some("https://img.example/a.png".to_string()),
            followers: vec![],
            following: vec!["u2".to_string()],
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_profile_serialization_excludes_password() {
        let json = serde_json::to_value(user().profile()).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["profilePicture"], "https://img.example/a.png");
        assert_eq!(json["following"][0], "u2");
    }

    #[test]
    fn test_is_following() {
        let u = user();
        assert!(u.is_following("u2"));
        assert!(!u.is_following("u3"));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Alice@Example.COM "), "alice@example.com");
    }
}
