// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup; handlers only ever see the
//! resulting [`Config`] through the shared application state.

use std::env;

/// Minimum length of the token signing secret.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Google Cloud Firestore (or the emulator via `FIRESTORE_EMULATOR_HOST`).
    Firestore,
    /// In-process store; data is lost on restart.
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid("STORAGE", s.to_string())),
        }
    }
}

/// Argon2 cost parameters for password hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        // argon2 crate defaults (OWASP minimum for Argon2id)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Storage backend selection
    pub storage: StorageBackend,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Origins allowed by CORS in addition to localhost
    pub allowed_origins: Vec<String>,
    /// Password hashing cost
    pub password_hash: PasswordHashConfig,
    /// Unsigned upload endpoint of the media host. `None` disables uploads
    /// (debug builds fall back to mock URLs).
    pub media_upload_url: Option<String>,
    /// Upload preset sent with every media upload
    pub media_upload_preset: String,
    /// Folder prefix on the media host
    pub media_folder_prefix: String,
}

impl Config {
    /// Config for tests: in-memory storage, cheap hashing, mock media host.
    pub fn test_default() -> Self {
        Self {
            port: 5000,
            gcp_project_id: "test-project".to_string(),
            storage: StorageBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            password_hash: PasswordHashConfig {
                memory_kib: 1024,
                iterations: 1,
            },
            media_upload_url: None,
            media_upload_preset: "test".to_string(),
            media_folder_prefix: "socialnet".to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = env::var("JWT_SECRET")
            .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
            .trim()
            .to_string()
            .into_bytes();
        if jwt_signing_key.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(
                "JWT_SECRET",
                format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
            ));
        }

        let defaults = PasswordHashConfig::default();

        Ok(Self {
            port: parse_or("PORT", 5000)?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage: env::var("STORAGE")
                .unwrap_or_else(|_| "firestore".to_string())
                .parse()?,
            jwt_signing_key,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            password_hash: PasswordHashConfig {
                memory_kib: parse_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
                iterations: parse_or("PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            },
            media_upload_url: env::var("MEDIA_UPLOAD_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            media_upload_preset: env::var("MEDIA_UPLOAD_PRESET")
                .unwrap_or_else(|_| "socialnet".to_string()),
            media_folder_prefix: env::var("MEDIA_FOLDER_PREFIX")
                .unwrap_or_else(|_| "socialnet".to_string()),
        })
    }
}

/// Parse an optional numeric variable, rejecting garbage instead of
/// silently falling back.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
