//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`FileStorage`], [`PasswordHasher`],
//! [`TokenService`], [`WelcomeMailer`]) are implemented in `outbound`.
//! Driving ports ([`Accounts`], [`UserDirectory`], [`Catalogs`],
//! [`Products`], [`Gallery`], [`Purchases`]) are implemented by the domain
//! services and consumed by `inbound`.

mod macros;
pub(crate) use macros::define_port_error;

mod accounts;
mod catalog_repository;
mod catalogs;
mod file_storage;
mod gallery;
mod image_repository;
mod password_hasher;
mod product_repository;
mod products;
mod purchases;
mod token_service;
mod transaction_repository;
mod user_directory;
mod user_repository;
mod welcome_mailer;

#[cfg(test)]
pub use accounts::MockAccounts;
pub use accounts::{Accounts, AuthSession};
#[cfg(test)]
pub use catalog_repository::MockCatalogRepository;
pub use catalog_repository::{CatalogDeletion, CatalogRepository, CatalogRepositoryError};
#[cfg(test)]
pub use catalogs::MockCatalogs;
pub use catalogs::Catalogs;
#[cfg(test)]
pub use file_storage::MockFileStorage;
pub use file_storage::{FileStorage, FileStorageError, FileUpload, StorageArea};
#[cfg(test)]
pub use gallery::MockGallery;
pub use gallery::{Gallery, ImagePlacement};
#[cfg(test)]
pub use image_repository::MockImageRepository;
pub use image_repository::{ImageRepository, ImageRepositoryError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use product_repository::MockProductRepository;
pub use product_repository::{ProductRepository, ProductRepositoryError};
#[cfg(test)]
pub use products::MockProducts;
pub use products::Products;
#[cfg(test)]
pub use purchases::MockPurchases;
pub use purchases::Purchases;
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{IssuedToken, TokenError, TokenService};
#[cfg(test)]
pub use transaction_repository::MockTransactionRepository;
pub use transaction_repository::{TransactionRepository, TransactionRepositoryError};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{PasswordChange, UserDirectory};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserDeletion, UserPersistenceError, UserRepository};
#[cfg(test)]
pub use welcome_mailer::MockWelcomeMailer;
pub use welcome_mailer::{MailerError, NoOpWelcomeMailer, WelcomeMailer};
