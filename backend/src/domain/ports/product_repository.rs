//! Port for product (`archivos`) persistence.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    NewProduct, Product, ProductChanges, ProductFilter, ProductId, ProductRemoval,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by product repository adapters.
    pub enum ProductRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "product repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "product repository query failed: {message}",
    }
}

/// Port for listing, writing, and removing products.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Page through products matching the filter.
    async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, ProductRepositoryError>;

    /// One product by id, active or not.
    async fn find(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError>;

    /// Every product among `ids` that exists, in no particular order.
    async fn find_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, ProductRepositoryError>;

    /// Insert a product, creating the seller row for its owner if needed.
    async fn create(&self, product: &NewProduct) -> Result<Product, ProductRepositoryError>;

    /// Apply a partial update; `None` when the id is unknown.
    async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, ProductRepositoryError>;

    /// Delete a product, or only deactivate it when purchases reference it.
    /// `None` when the id is unknown.
    async fn remove(&self, id: ProductId)
    -> Result<Option<ProductRemoval>, ProductRepositoryError>;

    /// Bump the download counter.
    async fn increment_downloads(&self, id: ProductId) -> Result<(), ProductRepositoryError>;
}
