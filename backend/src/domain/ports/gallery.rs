//! Driving port for product gallery maintenance.

use async_trait::async_trait;

use crate::domain::{Actor, Error, ImageChanges, ImageId, ProductId, ProductImage};

use super::FileUpload;

/// Where a new image goes in the gallery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImagePlacement {
    /// Explicit position; appended when `None`.
    pub order: Option<i32>,
    /// Make the new image the cover.
    pub is_cover: bool,
}

/// Domain use-case port for gallery images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Gallery: Send + Sync {
    /// Images of a product in gallery order.
    async fn list(&self, product_id: ProductId) -> Result<Vec<ProductImage>, Error>;

    /// Store and attach an image (owner or administrator).
    async fn add(
        &self,
        actor: Actor,
        product_id: ProductId,
        upload: FileUpload,
        placement: ImagePlacement,
    ) -> Result<ProductImage, Error>;

    /// Change position or cover flag.
    async fn update(
        &self,
        actor: Actor,
        id: ImageId,
        changes: ImageChanges,
    ) -> Result<ProductImage, Error>;

    /// Make an image the cover.
    async fn set_cover(&self, actor: Actor, id: ImageId) -> Result<ProductImage, Error>;

    /// Rewrite gallery order in one step.
    async fn reorder(
        &self,
        actor: Actor,
        product_id: ProductId,
        order: Vec<ImageId>,
    ) -> Result<Vec<ProductImage>, Error>;

    /// Delete an image and its stored file.
    async fn delete(&self, actor: Actor, id: ImageId) -> Result<(), Error>;
}
