//! Port for product gallery persistence.
//!
//! Every mutation that touches `es_portada` runs in one transaction so a
//! product with images always has exactly one cover.

use async_trait::async_trait;

use crate::domain::{
    ImageChanges, ImageId, ImageRemoval, NewProductImage, ProductId, ProductImage,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by image repository adapters.
    pub enum ImageRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "image repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "image repository query failed: {message}",
        /// A reorder request did not list exactly the product's images.
        OrderMismatch => "image order must list every image of the product exactly once",
    }
}

/// Port for gallery images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Images of a product ordered by `orden`, then id.
    async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductImage>, ImageRepositoryError>;

    /// One image by id.
    async fn find(&self, id: ImageId) -> Result<Option<ProductImage>, ImageRepositoryError>;

    /// Insert an image. The first image of a product, or one flagged as
    /// cover, becomes the only cover.
    async fn add(&self, image: &NewProductImage) -> Result<ProductImage, ImageRepositoryError>;

    /// Change position and/or cover flag; `None` when the id is unknown.
    async fn update(
        &self,
        id: ImageId,
        changes: ImageChanges,
    ) -> Result<Option<ProductImage>, ImageRepositoryError>;

    /// Make the image the product's only cover; `None` when unknown.
    async fn set_cover(&self, id: ImageId) -> Result<Option<ProductImage>, ImageRepositoryError>;

    /// Rewrite `orden` to follow `order`, which must list every image of
    /// the product exactly once.
    async fn reorder(
        &self,
        product_id: ProductId,
        order: &[ImageId],
    ) -> Result<Vec<ProductImage>, ImageRepositoryError>;

    /// Delete an image, promoting the next one when it was the cover.
    /// `None` when the id is unknown.
    async fn remove(&self, id: ImageId) -> Result<Option<ImageRemoval>, ImageRepositoryError>;
}
