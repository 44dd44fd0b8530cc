//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{NewUser, User, UserChanges, UserCredentials, UserFilter, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The email address is already registered.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

/// Outcome of a guarded user delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDeletion {
    /// The user and its role rows were removed.
    Deleted,
    /// No user has the id.
    NotFound,
    /// The user still owns products or transactions.
    Referenced {
        /// Products listed by the user.
        products: i64,
        /// Purchases made by the user.
        transactions: i64,
    },
}

/// Port for user accounts and their `vendedor`/`cliente` role rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and, in the same transaction, the role row matching
    /// its role.
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user and its password hash by normalised email.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, UserPersistenceError>;

    /// Fetch a user and its password hash by id.
    async fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<UserCredentials>, UserPersistenceError>;

    /// Page through users.
    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Page<User>, UserPersistenceError>;

    /// Apply a partial update; a role change also creates the matching role
    /// row when missing. `None` when the id is unknown.
    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Replace the stored password hash; `false` when the id is unknown.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<bool, UserPersistenceError>;

    /// Delete a user that owns no products and made no purchases.
    async fn delete_unreferenced(&self, id: UserId) -> Result<UserDeletion, UserPersistenceError>;
}
