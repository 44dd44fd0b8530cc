//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{Accounts, Catalogs, Gallery, Products, Purchases, UserDirectory};

/// Default cap on multipart upload size: 50 MiB.
pub const DEFAULT_UPLOAD_LIMIT: usize = 50 * 1024 * 1024;

/// Parameter object bundling all driving ports used by HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Registration, login, and token resolution.
    pub accounts: Arc<dyn Accounts>,
    /// User administration and profile edits.
    pub users: Arc<dyn UserDirectory>,
    /// Lookup tables.
    pub catalogs: Arc<dyn Catalogs>,
    /// Product listing and maintenance.
    pub products: Arc<dyn Products>,
    /// Product galleries.
    pub gallery: Arc<dyn Gallery>,
    /// Transactions and line items.
    pub purchases: Arc<dyn Purchases>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn Accounts>,
    pub users: Arc<dyn UserDirectory>,
    pub catalogs: Arc<dyn Catalogs>,
    pub products: Arc<dyn Products>,
    pub gallery: Arc<dyn Gallery>,
    pub purchases: Arc<dyn Purchases>,
    /// Largest accepted multipart file part, in bytes.
    pub upload_limit: usize,
}

impl HttpState {
    /// Construct state from the ports bundle with the default upload limit.
    pub fn new(ports: HttpStatePorts) -> Self {
        Self::with_upload_limit(ports, DEFAULT_UPLOAD_LIMIT)
    }

    /// Construct state with an explicit upload limit.
    pub fn with_upload_limit(ports: HttpStatePorts, upload_limit: usize) -> Self {
        let HttpStatePorts {
            accounts,
            users,
            catalogs,
            products,
            gallery,
            purchases,
        } = ports;
        Self {
            accounts,
            users,
            catalogs,
            products,
            gallery,
            purchases,
            upload_limit,
        }
    }
}
