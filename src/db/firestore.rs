// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage and follow lists)
//! - Uniqueness claims (emails and usernames)
//! - Posts (with embedded comments and likes)

use crate::db::{collections, username_matches};
use crate::error::AppError;
use crate::models::user::normalize_key;
use crate::models::{Post, UniqueClaim, User};
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreWritePrecondition};
use serde::de::DeserializeOwned;

/// Fields written by a profile update. Follow lists are owned by the
/// graph transaction and must not be overwritten from a stale copy.
const PROFILE_FIELDS: [&str; 3] = ["username", "bio", "profile_picture"];
/// Fields written by a follow/unfollow transaction.
const GRAPH_FIELDS: [&str; 2] = ["followers", "following"];
/// Commit attempts for a read-modify-write before giving up under contention.
const MAX_TRANSACTION_ATTEMPTS: u32 = 10;
/// Base delay between contended attempts, scaled by the attempt number.
const CONTENTION_BACKOFF_MS: u64 = 20;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator rejects real credentials, so skip the default token source.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Uniqueness Claims ───────────────────────────────────────

    /// Document ID for a claim: normalized value, URL-encoded so that
    /// characters like `/` are safe in a document path.
    fn claim_key(value: &str) -> String {
        urlencoding::encode(&normalize_key(value)).into_owned()
    }

    /// Reserve `value` in `collection` for `user_id`.
    ///
    /// Uses Firestore's create semantics: the insert fails if the document
    /// already exists, which we surface as `Conflict(conflict_message)`.
    async fn insert_claim(
        &self,
        collection: &str,
        value: &str,
        user_id: &str,
        conflict_message: &str,
    ) -> Result<(), AppError> {
        let claim = UniqueClaim {
            user_id: user_id.to_string(),
        };

        let result: Result<UniqueClaim, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(Self::claim_key(value))
            .object(&claim)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => {
                Err(AppError::Conflict(conflict_message.to_string()))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Release a claim. Failures are logged, never returned: a leaked claim
    /// only blocks reuse of the value.
    async fn release_claim(&self, collection: &str, value: &str) {
        let result = match self.get_client() {
            Ok(client) => client
                .fluent()
                .delete()
                .from(collection)
                .document_id(Self::claim_key(value))
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(collection, error = %e, "Failed to release uniqueness claim");
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a user after claiming its email and username.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        self.insert_claim(
            collections::USER_EMAILS,
            &user.email,
            &user.id,
            "Email already exists",
        )
        .await?;

        if let Err(e) = self
            .insert_claim(
                collections::USER_NAMES,
                &user.username,
                &user.id,
                "Username already taken",
            )
            .await
        {
            self.release_claim(collections::USER_EMAILS, &user.email)
                .await;
            return Err(e);
        }

        let written: Result<(), AppError> = async {
            let _: () = self
                .get_client()?
                .fluent()
                .update()
                .in_col(collections::USERS)
                .document_id(&user.id)
                .object(user)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            self.release_claim(collections::USER_EMAILS, &user.email)
                .await;
            self.release_claim(collections::USER_NAMES, &user.username)
                .await;
            return Err(e);
        }

        Ok(())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look a user up through its email claim.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let claim: Option<UniqueClaim> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_EMAILS)
            .obj()
            .one(&Self::claim_key(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match claim {
            Some(claim) => self.get_user(&claim.user_id).await,
            None => Ok(None),
        }
    }

    /// Write profile fields, moving the username claim if it changed.
    pub async fn save_profile(&self, user: &User, previous_username: &str) -> Result<(), AppError> {
        let renamed = normalize_key(&user.username) != normalize_key(previous_username);

        if renamed {
            self.insert_claim(
                collections::USER_NAMES,
                &user.username,
                &user.id,
                "Username already taken",
            )
            .await?;
        }

        let written: Result<(), AppError> = async {
            let _: () = self
                .get_client()?
                .fluent()
                .update()
                .fields(PROFILE_FIELDS)
                .in_col(collections::USERS)
                .document_id(&user.id)
                .object(user)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Ok(())
        }
        .await;

        match written {
            Ok(()) if renamed => {
                self.release_claim(collections::USER_NAMES, previous_username)
                    .await;
                Ok(())
            }
            Ok(()) => Ok(()),
            Err(e) => {
                if renamed {
                    self.release_claim(collections::USER_NAMES, &user.username)
                        .await;
                }
                Err(e)
            }
        }
    }

    /// Case-insensitive substring search over usernames.
    ///
    /// Firestore has no substring index, so this scans the collection.
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("username", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let needle = query.to_lowercase();
        Ok(users
            .into_iter()
            .filter(|u| username_matches(&u.username, &needle))
            .collect())
    }

    /// Read two users, apply `f`, and commit both follow lists in a single
    /// transaction so the edge is never left half-written.
    ///
    /// Both reads go through the transaction, so a concurrent writer to
    /// either user aborts the commit and the whole cycle is retried.
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
        let client = self.get_client()?;

        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
            let reader = client.clone_with_consistency_selector(
                FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
            );

            let first: Option<User> = read_by_id(&reader, collections::USERS, first_id).await?;
            let second: Option<User> = read_by_id(&reader, collections::USERS, second_id).await?;

            let (mut first, mut second) = match (first, second) {
                (Some(first), Some(second)) => (first, second),
                _ => {
                    let _ = transaction.rollback().await;
                    return Ok(None);
                }
            };

            let output = match f(&mut first, &mut second) {
                Ok(output) => output,
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(e);
                }
            };

            for user in [&first, &second] {
                client
                    .fluent()
                    .update()
                    .fields(GRAPH_FIELDS)
                    .in_col(collections::USERS)
                    .precondition(FirestoreWritePrecondition::Exists(true))
                    .document_id(&user.id)
                    .object(user)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add user to transaction: {}", e))
                    })?;
            }

            match transaction.commit().await {
                Ok(_) => return Ok(Some(output)),
                Err(FirestoreError::DataNotFoundError(_)) => return Ok(None),
                Err(e) if is_contention(&e) => {
                    tracing::debug!(
                        attempt,
                        first_id,
                        second_id,
                        error = %e,
                        "User pair transaction contended, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(
                        CONTENTION_BACKOFF_MS * u64::from(attempt),
                    ))
                    .await;
                }
                Err(e) => {
                    return Err(AppError::Database(format!("Transaction commit failed: {}", e)))
                }
            }
        }

        Err(AppError::Database(format!(
            "User pair update gave up after {} contended attempts",
            MAX_TRANSACTION_ATTEMPTS
        )))
    }

    // ─── Post Operations ─────────────────────────────────────────

    /// Store a post.
    pub async fn create_post(&self, post: &Post) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::POSTS)
            .document_id(&post.id)
            .object(post)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a post by ID.
    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::POSTS)
            .obj()
            .one(post_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Posts by one author, newest first.
    pub async fn list_posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post document (comments are embedded and go with it).
    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::POSTS)
            .document_id(post_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Read a post, apply `f`, and write it back in a transaction.
    ///
    /// The write requires the document to still exist, so an update racing
    /// a delete reports the post as gone instead of recreating it.
    pub async fn update_post<T, F>(&self, post_id: &str, mut f: F) -> Result<Option<T>, AppError>
    where
        F: FnMut(&mut Post) -> Result<T, AppError> + Send,
        T: Send,
    {
        let client = self.get_client()?;

        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
            let reader = client.clone_with_consistency_selector(
                FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
            );

            let Some(mut post) = read_by_id::<Post>(&reader, collections::POSTS, post_id).await?
            else {
                let _ = transaction.rollback().await;
                return Ok(None);
            };

            let output = match f(&mut post) {
                Ok(output) => output,
                Err(e) => {
                    let _ = transaction.rollback().await;
                    return Err(e);
                }
            };

            client
                .fluent()
                .update()
                .in_col(collections::POSTS)
                .precondition(FirestoreWritePrecondition::Exists(true))
                .document_id(&post.id)
                .object(&post)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add post to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(Some(output)),
                Err(FirestoreError::DataNotFoundError(_)) => return Ok(None),
                Err(e) if is_contention(&e) => {
                    tracing::debug!(
                        attempt,
                        post_id,
                        error = %e,
                        "Post transaction contended, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(
                        CONTENTION_BACKOFF_MS * u64::from(attempt),
                    ))
                    .await;
                }
                Err(e) => {
                    return Err(AppError::Database(format!("Transaction commit failed: {}", e)))
                }
            }
        }

        Err(AppError::Database(format!(
            "Post update gave up after {} contended attempts",
            MAX_TRANSACTION_ATTEMPTS
        )))
    }
}

/// Read one document through `reader`, which may be bound to a transaction.
async fn read_by_id<T>(
    reader: &firestore::FirestoreDb,
    collection: &str,
    id: &str,
) -> Result<Option<T>, AppError>
where
    T: DeserializeOwned + Send,
{
    reader
        .fluent()
        .select()
        .by_id_in(collection)
        .obj()
        .one(id)
        .await
        .map_err(|e| AppError::Database(format!("Failed to read in transaction: {}", e)))
}

/// Aborted or otherwise retryable commit, typically a concurrent writer.
fn is_contention(error: &FirestoreError) -> bool {
    match error {
        FirestoreError::DatabaseError(e) => e.retry_possible,
        _ => false,
    }
}
