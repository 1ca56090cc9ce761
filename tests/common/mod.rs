// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use serde_json::Value;
use socialnet_api::config::Config;
use socialnet_api::db::{Database, FirestoreDb, MemoryDb};
use socialnet_api::middleware::auth::create_jwt;
use socialnet_api::routes::create_router;
use socialnet_api::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Multipart boundary used by [`multipart_body`].
#[allow(dead_code)]
pub const BOUNDARY: &str = "socialnet-test-boundary";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Database::Memory(MemoryDb::new());
    let state = Arc::new(AppState::new(config, db).expect("Failed to build state"));

    (create_router(state.clone()), state)
}

/// Create a valid session token for `user_id`.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str) -> String {
    create_jwt(user_id, &Config::test_default().jwt_signing_key).expect("Failed to create JWT")
}

/// Send a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub async fn send_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

/// A part of a multipart form.
#[allow(dead_code)]
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Encode parts as a `multipart/form-data` body delimited by [`BOUNDARY`].
#[allow(dead_code)]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Send a multipart form with a bearer token.
#[allow(dead_code)]
pub async fn send_multipart(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: &str,
    parts: &[Part<'_>],
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user and return `(user_id, token)`.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, username: &str, email: &str) -> (String, String) {
    let response = send_json(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "username": username,
            "email": email,
            "password": "pw123456",
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    (
        json["user"]["id"].as_str().unwrap().to_string(),
        json["token"].as_str().unwrap().to_string(),
    )
}

/// Create a text-only post and return its ID.
#[allow(dead_code)]
pub async fn create_post(app: &axum::Router, token: &str, text: &str) -> String {
    let response = send_multipart(
        app,
        Method::POST,
        "/api/posts",
        token,
        &[Part::Text("text", text)],
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    body_json(response).await["post"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}
