// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Concurrent mutations of a single post or user through the HTTP API.

use axum::http::{Method, StatusCode};
use futures_util::future::join_all;

mod common;
use common::{body_json, create_post, create_test_app, register, send_json};

const WRITERS: usize = 16;

async fn register_many(app: &axum::Router, count: usize) -> Vec<(String, String)> {
    let mut users = Vec::with_capacity(count);
    for i in 0..count {
        users.push(register(app, &format!("user{:02}", i), &format!("u{}@x.com", i)).await);
    }
    users
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_likes_are_all_kept() {
    let (app, _) = create_test_app();
    let (_, author) = register(&app, "author", "author@x.com").await;
    let post_id = create_post(&app, &author, "popular").await;
    let fans = register_many(&app, WRITERS).await;

    let like_uri = format!("/api/posts/like/{}", post_id);
    let tasks = fans.into_iter().map(|(_, token)| {
        let app = app.clone();
        let uri = like_uri.clone();
        tokio::spawn(async move {
            send_json(&app, Method::PUT, &uri, Some(&token), None)
                .await
                .status()
        })
    });

    for status in join_all(tasks).await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let post = body_json(
        send_json(
            &app,
            Method::GET,
            &format!("/api/posts/{}", post_id),
            Some(&author),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(post["likes"].as_array().unwrap().len(), WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_comments_are_all_kept() {
    let (app, _) = create_test_app();
    let (_, author) = register(&app, "author", "author@x.com").await;
    let post_id = create_post(&app, &author, "discuss").await;

    let comments_uri = format!("/api/posts/{}/comments", post_id);
    let tasks = (0..WRITERS).map(|i| {
        let app = app.clone();
        let uri = comments_uri.clone();
        let token = author.clone();
        tokio::spawn(async move {
            send_json(
                &app,
                Method::POST,
                &uri,
                Some(&token),
                Some(serde_json::json!({ "text": format!("comment {}", i) })),
            )
            .await
            .status()
        })
    });

    for status in join_all(tasks).await {
        assert_eq!(status.unwrap(), StatusCode::CREATED);
    }

    let comments =
        body_json(send_json(&app, Method::GET, &comments_uri, Some(&author), None).await).await;
    assert_eq!(comments.as_array().unwrap().len(), WRITERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_follows_keep_both_sides_in_sync() {
    let (app, _) = create_test_app();
    let (star_id, star) = register(&app, "star", "star@x.com").await;
    let fans = register_many(&app, WRITERS).await;

    let follow_uri = format!("/api/users/follow/{}", star_id);
    let tasks = fans.iter().cloned().map(|(_, token)| {
        let app = app.clone();
        let uri = follow_uri.clone();
        tokio::spawn(async move {
            send_json(&app, Method::PUT, &uri, Some(&token), None)
                .await
                .status()
        })
    });

    for status in join_all(tasks).await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let profile = body_json(
        send_json(
            &app,
            Method::GET,
            &format!("/api/users/{}", star_id),
            Some(&star),
            None,
        )
        .await,
    )
    .await;
    let followers = profile["followers"].as_array().unwrap();
    assert_eq!(followers.len(), WRITERS);

    for (fan_id, fan_token) in &fans {
        assert!(followers.iter().any(|f| f == fan_id.as_str()));

        let fan = body_json(
            send_json(
                &app,
                Method::GET,
                &format!("/api/users/{}", fan_id),
                Some(fan_token),
                None,
            )
            .await,
        )
        .await;
        assert_eq!(fan["following"], serde_json::json!([star_id]));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_like_racing_delete_never_restores_post() {
    let (app, _) = create_test_app();
    let (_, author) = register(&app, "author", "author@x.com").await;
    let post_id = create_post(&app, &author, "short lived").await;
    let fans = register_many(&app, 8).await;

    let like_uri = format!("/api/posts/like/{}", post_id);
    let post_uri = format!("/api/posts/{}", post_id);

    let likes = fans.into_iter().map(|(_, token)| {
        let app = app.clone();
        let uri = like_uri.clone();
        tokio::spawn(async move {
            send_json(&app, Method::PUT, &uri, Some(&token), None)
                .await
                .status()
        })
    });
    let delete = {
        let app = app.clone();
        let uri = post_uri.clone();
        let token = author.clone();
        tokio::spawn(async move {
            send_json(&app, Method::DELETE, &uri, Some(&token), None)
                .await
                .status()
        })
    };

    for status in join_all(likes).await {
        let status = status.unwrap();
        assert!(
            status == StatusCode::OK || status == StatusCode::NOT_FOUND,
            "unexpected {}",
            status
        );
    }
    assert_eq!(delete.await.unwrap(), StatusCode::OK);

    let gone = send_json(&app, Method::GET, &post_uri, Some(&author), None).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}
