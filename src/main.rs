// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Socialnet API Server
//!
//! REST backend for registration, posts, likes, comments, and follows.

use socialnet_api::{
    config::{Config, StorageBackend},
    db::{Database, FirestoreDb, MemoryDb},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, storage = ?config.storage, "Starting Socialnet API");

    // A store that cannot be reached at startup is fatal.
    let db = match config.storage {
        StorageBackend::Firestore => {
            Database::Firestore(FirestoreDb::new(&config.gcp_project_id).await?)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Database::Memory(MemoryDb::new())
        }
    };

    if config.media_upload_url.is_none() {
        tracing::warn!("MEDIA_UPLOAD_URL not set; image uploads are unavailable");
    }

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db)?);

    // Build router
    let app = socialnet_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("socialnet_api=debug,info")),
        )
        .with(format)
        .init();
}
