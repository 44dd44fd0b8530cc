//! Domain primitives, aggregates, and use-case services.
//!
//! Purpose: define the strongly typed marketplace entities shared by the
//! HTTP and persistence layers, the ports those layers plug into, and the
//! services that enforce ownership, role, and consistency rules.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Identifier newtypes, [`Price`], catalogs, users, products, images,
//!   transactions.
//! - Services implementing the driving ports in [`ports`].

pub mod account_service;
pub mod catalog;
pub mod catalog_service;
pub mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod gallery_service;
pub mod ids;
pub mod image;
mod port_errors;
pub mod ports;
pub mod price;
pub mod product;
pub mod product_service;
pub mod purchase_service;
pub mod trace_id;
pub mod transaction;
pub mod user;
pub mod user_directory_service;

pub use self::account_service::AccountService;
pub use self::catalog::{
    CATALOG_NAME_MAX, CatalogEntry, CatalogKind, CatalogName, CatalogNameError, CatalogRecord,
};
pub use self::catalog_service::CatalogService;
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::gallery_service::GalleryService;
pub use self::ids::{CatalogId, DetailId, ImageId, ProductId, SellerId, TransactionId, UserId};
pub use self::image::{ImageChanges, ImageRemoval, NewProductImage, ProductImage};
pub use self::price::{Price, PriceError};
pub use self::product::{
    DESCRIPTION_MAX, Download, NewProduct, PRODUCT_NAME_MAX, Product, ProductChanges,
    ProductDeletion, ProductDetail, ProductDraft, ProductFilter, ProductRemoval, ProductSort,
    ProductValidationError, validate_description, validate_product_name,
};
pub use self::product_service::ProductService;
pub use self::purchase_service::PurchaseService;
pub use self::trace_id::TraceId;
pub use self::transaction::{
    Checkout, DetailRecord, NewTransaction, PAYPAL_METHOD_ID, PAYPAL_METHOD_NAME, PaypalCapture,
    REFERENCE_MAX, STATUS_CANCELLED, STATUS_COMPLETED, STATUS_PENDING, STATUS_REFUNDED, SaleLine,
    Transaction, TransactionDetail, TransactionFilter,
};
pub use self::user::{
    Actor, EmailAddress, LoginCredentials, NewUser, PASSWORD_MAX, PASSWORD_MIN, PlainPassword,
    Registration, USER_NAME_MAX, User, UserChanges, UserCredentials, UserFilter, UserName,
    UserRole, UserValidationError,
};
pub use self::user_directory_service::UserDirectoryService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use mercado::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
