//! Driving port for product listing, upload, maintenance, and download.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    Actor, Download, Error, Product, ProductChanges, ProductDeletion, ProductDetail,
    ProductDraft, ProductFilter, ProductId,
};

use super::FileUpload;

/// Domain use-case port for products.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Products: Send + Sync {
    /// Public listing of active products.
    async fn list(&self, filter: ProductFilter, page: PageRequest)
    -> Result<Page<Product>, Error>;

    /// The caller's own products, hidden ones included.
    async fn list_mine(&self, actor: Actor, page: PageRequest) -> Result<Page<Product>, Error>;

    /// Product with its gallery. Inactive products are visible only to
    /// their owner and administrators.
    async fn get(&self, viewer: Option<Actor>, id: ProductId) -> Result<ProductDetail, Error>;

    /// Store the upload and list it for sale.
    async fn create(
        &self,
        actor: Actor,
        draft: ProductDraft,
        upload: FileUpload,
    ) -> Result<Product, Error>;

    /// Edit metadata (owner or administrator).
    async fn update(
        &self,
        actor: Actor,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, Error>;

    /// Remove a product, or hide it when purchases reference it.
    async fn delete(&self, actor: Actor, id: ProductId) -> Result<ProductDeletion, Error>;

    /// Authorise a download and locate the stored file.
    async fn download(&self, actor: Actor, id: ProductId) -> Result<Download, Error>;

    /// Count a download that was served in full.
    async fn record_download(&self, id: ProductId) -> Result<(), Error>;
}
