//! Driving port for registration, login, and bearer-token resolution.
//!
//! Inbound adapters call this port to authenticate callers without knowing
//! how passwords are hashed or tokens are signed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Error, LoginCredentials, Registration, User};

/// Token returned by a successful registration or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthSession {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Token expiry.
    #[serde(rename = "expira")]
    pub expires_at: DateTime<Utc>,
    /// The authenticated user.
    #[serde(rename = "usuario")]
    pub user: User,
}

/// Domain use-case port for account access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Accounts: Send + Sync {
    /// Create an account and sign the new user in.
    async fn register(&self, registration: Registration) -> Result<AuthSession, Error>;

    /// Check credentials and sign the user in.
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error>;

    /// Resolve a bearer token to the user it names.
    async fn resolve_token(&self, token: &str) -> Result<User, Error>;
}
