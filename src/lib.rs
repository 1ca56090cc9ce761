// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Socialnet: a small social network backend.
//!
//! Users register and log in, publish text/image posts, like and comment
//! on posts, and follow each other. This crate provides the REST API over
//! a Firestore (or in-memory) document store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use error::AppError;
use services::{GraphService, MediaService, PasswordService, PostService, UserService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub users: UserService,
    pub posts: PostService,
    pub graph: GraphService,
}

impl AppState {
    /// Wire the services on top of an open database.
    pub fn new(config: Config, db: Database) -> Result<Self, AppError> {
        let passwords = PasswordService::new(config.password_hash)?;
        let media = MediaService::new(&config);

        Ok(Self {
            users: UserService::new(db.clone(), passwords, media.clone()),
            posts: PostService::new(db.clone(), media),
            graph: GraphService::new(db.clone()),
            config,
            db,
        })
    }
}
