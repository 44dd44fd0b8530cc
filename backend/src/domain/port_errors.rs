//! Translations from driven-port errors to domain [`Error`]s.
//!
//! Connection failures surface as 503 so clients can retry; query failures
//! are internal errors whose message is redacted at the HTTP edge.

use crate::domain::Error;
use crate::domain::ports::{
    CatalogRepositoryError, FileStorageError, ImageRepositoryError, PasswordHashError,
    ProductRepositoryError, TransactionRepositoryError, UserPersistenceError,
};

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered"))
        }
    }
}

pub(crate) fn map_catalog_error(error: CatalogRepositoryError) -> Error {
    match error {
        CatalogRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("catalog repository unavailable: {message}"))
        }
        CatalogRepositoryError::Query { message } => {
            Error::internal(format!("catalog repository error: {message}"))
        }
        CatalogRepositoryError::DuplicateName { name } => {
            Error::conflict(format!("an entry named {name} already exists"))
        }
    }
}

pub(crate) fn map_product_error(error: ProductRepositoryError) -> Error {
    match error {
        ProductRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("product repository unavailable: {message}"))
        }
        ProductRepositoryError::Query { message } => {
            Error::internal(format!("product repository error: {message}"))
        }
    }
}

pub(crate) fn map_image_error(error: ImageRepositoryError) -> Error {
    match error {
        ImageRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("image repository unavailable: {message}"))
        }
        ImageRepositoryError::Query { message } => {
            Error::internal(format!("image repository error: {message}"))
        }
        ImageRepositoryError::OrderMismatch => Error::invalid_request(
            "orden must list every image of the product exactly once",
        ),
    }
}

pub(crate) fn map_transaction_error(error: TransactionRepositoryError) -> Error {
    match error {
        TransactionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("transaction repository unavailable: {message}"))
        }
        TransactionRepositoryError::Query { message } => {
            Error::internal(format!("transaction repository error: {message}"))
        }
        TransactionRepositoryError::DuplicateReference { reference } => {
            Error::conflict(format!("payment {reference} has already been recorded"))
        }
    }
}

pub(crate) fn map_storage_error(error: FileStorageError) -> Error {
    match error {
        FileStorageError::Io { message } => Error::internal(format!("file storage error: {message}")),
        FileStorageError::Rejected { message } => Error::invalid_request(message),
    }
}

pub(crate) fn map_hash_error(error: PasswordHashError) -> Error {
    match error {
        PasswordHashError::Hash { message } => {
            Error::internal(format!("password hashing failed: {message}"))
        }
    }
}

/// Shorthand for the 403 returned when the caller lacks a role.
pub(crate) fn admin_required() -> Error {
    Error::forbidden("administrator role required")
}
