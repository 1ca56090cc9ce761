// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod graph;
pub mod media;
pub mod password;
pub mod posts;
pub mod users;

pub use graph::GraphService;
pub use media::{ImageUpload, MediaFolder, MediaService};
pub use password::PasswordService;
pub use posts::PostService;
pub use users::UserService;
