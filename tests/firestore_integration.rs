// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST` set); they are skipped otherwise.
//!
//! Every test uses fresh IDs, emails, and usernames so runs never collide.

use futures_util::future::join_all;
use socialnet_api::error::AppError;
use socialnet_api::models::{add_to_set, new_id, Comment, Post, User};
use socialnet_api::time_utils::now_rfc3339;

mod common;
use common::test_db;

/// Short unique suffix for names that must be unique across runs.
fn unique() -> String {
    new_id()[..8].to_string()
}

fn test_user(username: &str) -> User {
    User {
        id: new_id(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_string(),
        bio: None,
        profile_picture: None,
        followers: vec![],
        following: vec![],
        created_at: now_rfc3339(),
    }
}

fn test_post(user_id: &str, created_at: &str) -> Post {
    Post {
        id: new_id(),
        user_id: user_id.to_string(),
        text: "hello".to_string(),
        image: None,
        likes: vec![],
        comments: vec![],
        created_at: created_at.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// USER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_new_user_creation() {
    require_emulator!();

    let db = test_db().await;
    let user = test_user(&format!("user_{}", unique()));

    // Initially, user should not exist
    assert!(db.get_user(&user.id).await.unwrap().is_none());

    db.create_user(&user).await.unwrap();

    let fetched = db.get_user(&user.id).await.unwrap().expect("User should exist");
    assert_eq!(fetched, user);

    let by_email = db
        .find_user_by_email(&user.email.to_uppercase())
        .await
        .unwrap()
        .expect("Email lookup should be case-insensitive");
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn test_duplicate_email_claim_conflicts() {
    require_emulator!();

    let db = test_db().await;
    let first = test_user(&format!("dup_{}", unique()));
    db.create_user(&first).await.unwrap();

    let mut second = test_user(&format!("other_{}", unique()));
    second.email = first.email.clone();

    let err = db.create_user(&second).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    assert!(db.get_user(&second.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_profile_moves_username_claim() {
    require_emulator!();

    let db = test_db().await;
    let mut user = test_user(&format!("before_{}", unique()));
    db.create_user(&user).await.unwrap();

    let previous = user.username.clone();
    user.username = format!("after_{}", unique());
    user.bio = Some("updated".to_string());
    db.save_profile(&user, &previous).await.unwrap();

    let fetched = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(fetched.username, user.username);
    assert_eq!(fetched.bio.as_deref(), Some("updated"));

    // The old name is free again
    let mut reuse = test_user(&previous);
    reuse.email = format!("reuse_{}@example.com", unique());
    db.create_user(&reuse).await.unwrap();
}

#[tokio::test]
async fn test_update_user_pair_writes_both_sides() {
    require_emulator!();

    let db = test_db().await;
    let a = test_user(&format!("a_{}", unique()));
    let b = test_user(&format!("b_{}", unique()));
    db.create_user(&a).await.unwrap();
    db.create_user(&b).await.unwrap();

    db.update_user_pair(&a.id, &b.id, |first, second| {
        add_to_set(&mut first.following, &second.id);
        add_to_set(&mut second.followers, &first.id);
        Ok(())
    })
    .await
    .unwrap()
    .expect("Both users exist");

    let a_after = db.get_user(&a.id).await.unwrap().unwrap();
    let b_after = db.get_user(&b.id).await.unwrap().unwrap();
    assert_eq!(a_after.following, vec![b.id.clone()]);
    assert_eq!(b_after.followers, vec![a.id.clone()]);

    // Closure failure leaves both untouched
    let result: Result<Option<()>, AppError> = db
        .update_user_pair(&a.id, &b.id, |first, _| {
            first.following.clear();
            Err(AppError::Conflict("abort".to_string()))
        })
        .await;
    assert!(result.is_err());
    let a_after = db.get_user(&a.id).await.unwrap().unwrap();
    assert_eq!(a_after.following, vec![b.id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_follows_of_one_user_are_all_kept() {
    require_emulator!();

    let db = test_db().await;
    let star = test_user(&format!("star_{}", unique()));
    db.create_user(&star).await.unwrap();

    let mut fans = Vec::new();
    for i in 0..8 {
        let fan = test_user(&format!("fan{}_{}", i, unique()));
        db.create_user(&fan).await.unwrap();
        fans.push(fan);
    }

    let tasks = fans.iter().map(|fan| {
        let db = db.clone();
        let fan_id = fan.id.clone();
        let star_id = star.id.clone();
        tokio::spawn(async move {
            db.update_user_pair(&fan_id, &star_id, |fan, star| {
                add_to_set(&mut fan.following, &star.id);
                add_to_set(&mut star.followers, &fan.id);
                Ok(())
            })
            .await
        })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap().expect("Both users exist");
    }

    let star_after = db.get_user(&star.id).await.unwrap().unwrap();
    assert_eq!(star_after.followers.len(), fans.len());
    for fan in &fans {
        assert!(star_after.followers.contains(&fan.id));
        let fan_after = db.get_user(&fan.id).await.unwrap().unwrap();
        assert_eq!(fan_after.following, vec![star.id.clone()]);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// POST TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_post_update_and_delete() {
    require_emulator!();

    let db = test_db().await;
    let author = new_id();
    let post = test_post(&author, &now_rfc3339());
    db.create_post(&post).await.unwrap();

    db.update_post(&post.id, |p| {
        p.toggle_like("fan");
        p.comments.push(Comment {
            id: new_id(),
            user_id: "fan".to_string(),
            text: "nice".to_string(),
            created_at: now_rfc3339(),
        });
        Ok(())
    })
    .await
    .unwrap()
    .expect("Post exists");

    let fetched = db.get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(fetched.likes, vec!["fan"]);
    assert_eq!(fetched.comments.len(), 1);

    db.delete_post(&post.id).await.unwrap();
    assert!(db.get_post(&post.id).await.unwrap().is_none());
    assert!(db.update_post(&post.id, |_| Ok(())).await.unwrap().is_none());
}

#[tokio::test]
async fn test_posts_by_user_newest_first() {
    require_emulator!();

    let db = test_db().await;
    let author = new_id();
    let old = test_post(&author, "2024-01-01T00:00:00.000Z");
    let new = test_post(&author, "2024-01-02T00:00:00.000Z");
    db.create_post(&old).await.unwrap();
    db.create_post(&new).await.unwrap();
    db.create_post(&test_post(&new_id(), "2024-01-03T00:00:00.000Z"))
        .await
        .unwrap();

    let posts = db.list_posts_by_user(&author).await.unwrap();
    let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![new.id.as_str(), old.id.as_str()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_on_one_post_are_all_kept() {
    require_emulator!();

    let db = test_db().await;
    let post = test_post(&new_id(), &now_rfc3339());
    db.create_post(&post).await.unwrap();

    let fans: Vec<String> = (0..8).map(|_| new_id()).collect();
    let tasks = fans.iter().map(|fan| {
        let db = db.clone();
        let post_id = post.id.clone();
        let fan = fan.clone();
        tokio::spawn(async move { db.update_post(&post_id, |p| Ok(p.toggle_like(&fan))).await })
    });
    for result in join_all(tasks).await {
        result.unwrap().unwrap().expect("Post exists");
    }

    let fetched = db.get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(fetched.likes.len(), fans.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_like_racing_delete_does_not_recreate_post() {
    require_emulator!();

    let db = test_db().await;
    let post = test_post(&new_id(), &now_rfc3339());
    db.create_post(&post).await.unwrap();

    let likes = (0..6).map(|_| {
        let db = db.clone();
        let post_id = post.id.clone();
        let fan = new_id();
        tokio::spawn(async move { db.update_post(&post_id, |p| Ok(p.toggle_like(&fan))).await })
    });
    let delete = {
        let db = db.clone();
        let post_id = post.id.clone();
        tokio::spawn(async move { db.delete_post(&post_id).await })
    };

    for result in join_all(likes).await {
        // Either applied before the delete or reported as gone
        result.unwrap().unwrap();
    }
    delete.await.unwrap().unwrap();

    assert!(db.get_post(&post.id).await.unwrap().is_none());
}
