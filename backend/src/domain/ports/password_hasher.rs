//! Port for one-way password hashing.

use async_trait::async_trait;

use crate::domain::PlainPassword;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing or verification could not run.
        Hash { message: String } => "password hashing failed: {message}",
    }
}

/// Hashes and verifies passwords.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted hash for storage.
    async fn hash(&self, password: &PlainPassword) -> Result<String, PasswordHashError>;

    /// Check a password against a stored hash.
    async fn verify(
        &self,
        password: &PlainPassword,
        hash: &str,
    ) -> Result<bool, PasswordHashError>;
}
