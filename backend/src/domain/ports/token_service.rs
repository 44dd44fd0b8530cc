//! Port for issuing and verifying bearer tokens.

use chrono::{DateTime, Utc};

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum TokenError {
        /// The token is malformed or its signature does not match.
        Invalid { message: String } => "invalid token: {message}",
        /// The token was valid but has expired.
        Expired => "token expired",
        /// A token could not be signed.
        Issue { message: String } => "failed to issue token: {message}",
    }
}

/// Signed token plus its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Encoded bearer token.
    pub token: String,
    /// Instant after which the token is rejected.
    pub expires_at: DateTime<Utc>,
}

/// Signs tokens identifying a user and verifies them on later requests.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Sign a token for `user`.
    fn issue(&self, user: &User) -> Result<IssuedToken, TokenError>;

    /// Verify a token and return the user it names.
    fn verify(&self, token: &str) -> Result<UserId, TokenError>;
}
