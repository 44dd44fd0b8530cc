//! Driving port for user administration and self-service profile edits.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Actor, Error, PlainPassword, User, UserChanges, UserFilter, UserId};

/// Password change request; the current password must verify.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    /// Password currently stored.
    pub current: PlainPassword,
    /// Replacement password.
    pub new: PlainPassword,
}

/// Domain use-case port for reading and maintaining user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Page through users (administrators only).
    async fn list(
        &self,
        actor: Actor,
        filter: UserFilter,
        page: PageRequest,
    ) -> Result<Page<User>, Error>;

    /// Read a user (self or administrator).
    async fn get(&self, actor: Actor, id: UserId) -> Result<User, Error>;

    /// Update a profile (self or administrator; roles change only by
    /// administrators).
    async fn update(&self, actor: Actor, id: UserId, changes: UserChanges) -> Result<User, Error>;

    /// Replace the caller's own password.
    async fn change_password(
        &self,
        actor: Actor,
        id: UserId,
        change: PasswordChange,
    ) -> Result<(), Error>;

    /// Delete a user that owns nothing (administrators only).
    async fn delete(&self, actor: Actor, id: UserId) -> Result<(), Error>;
}
