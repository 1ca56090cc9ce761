// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and verification (Argon2id, random per-password salt).

use crate::config::PasswordHashConfig;
use crate::error::AppError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Argon2id hasher with configurable cost.
#[derive(Clone)]
pub struct PasswordService {
    params: Params,
}

impl PasswordService {
    pub fn new(config: PasswordHashConfig) -> Result<Self, AppError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string (algorithm, cost, and salt included).
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored PHC string.
    ///
    /// The cost parameters embedded in the hash are used, so hashes made
    /// under an older configuration still verify.
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(password_hash).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Invalid password hash format: {}", e))
        })?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(anyhow::anyhow!(
                "Password verification failed: {}",
                e
            ))),
        }
    }

    /// [`Self::hash`] on the blocking pool; Argon2 is deliberately slow.
    pub async fn hash_blocking(&self, password: String) -> Result<String, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
    }

    /// [`Self::verify`] on the blocking pool.
    pub async fn verify_blocking(
        &self,
        password: String,
        password_hash: String,
    ) -> Result<bool, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &password_hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Verification task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new(PasswordHashConfig {
            memory_kib: 1024,
            iterations: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = service();
        let hash = hasher.hash("pw123456").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("pw123456"));
        assert!(hasher.verify("pw123456", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = service();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_verify_uses_cost_from_hash() {
        let cheap = service();
        let hash = cheap.hash("pw123456").unwrap();

        let stronger = PasswordService::new(PasswordHashConfig {
            memory_kib: 2048,
            iterations: 2,
        })
        .unwrap();
        assert!(stronger.verify("pw123456", &hash).unwrap());
    }

    #[test]
    fn test_rejects_invalid_params() {
        assert!(PasswordService::new(PasswordHashConfig {
            memory_kib: 1,
            iterations: 1,
        })
        .is_err());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(service().verify("pw", "plaintext").is_err());
    }
}
