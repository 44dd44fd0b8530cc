//! bcrypt-backed `PasswordHasher`.
//!
//! Hashing is CPU bound, so both operations run on the blocking pool.

use async_trait::async_trait;

use crate::domain::PlainPassword;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// bcrypt implementation of the `PasswordHasher` port.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Hasher using `cost` rounds (bcrypt accepts 4..=31).
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

fn hash_error(error: impl std::fmt::Display) -> PasswordHashError {
    PasswordHashError::hash(error.to_string())
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &PlainPassword) -> Result<String, PasswordHashError> {
        let password = password.clone();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password.expose(), cost))
            .await
            .map_err(hash_error)?
            .map_err(hash_error)
    }

    async fn verify(
        &self,
        password: &PlainPassword,
        hash: &str,
    ) -> Result<bool, PasswordHashError> {
        let password = password.clone();
        let hash = hash.to_owned();
        match tokio::task::spawn_blocking(move || bcrypt::verify(password.expose(), &hash))
            .await
            .map_err(hash_error)?
        {
            Ok(matches) => Ok(matches),
            // A malformed stored hash can never match.
            Err(bcrypt::BcryptError::InvalidHash(_)) => Ok(false),
            Err(error) => Err(hash_error(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn password(raw: &str) -> PlainPassword {
        PlainPassword::parse(raw.to_owned()).expect("valid password")
    }

    #[rstest]
    #[tokio::test]
    async fn hashes_verify_against_their_password() {
        let hasher = BcryptPasswordHasher::new(4);
        let hash = hasher.hash(&password("secreto123")).await.expect("hash");

        assert!(hash.starts_with("$2"));
        assert!(hasher.verify(&password("secreto123"), &hash).await.expect("verify"));
        assert!(!hasher.verify(&password("otra-clave"), &hash).await.expect("verify"));
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_hashes_never_match() {
        let hasher = BcryptPasswordHasher::new(4);
        let matched = hasher
            .verify(&password("secreto123"), "not-a-bcrypt-hash")
            .await
            .expect("verify");
        assert!(!matched);
    }
}
