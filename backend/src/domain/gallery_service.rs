//! Gallery images: upload, ordering, cover selection, and removal.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::port_errors::{map_image_error, map_product_error, map_storage_error};
use crate::domain::ports::{
    FileStorage, FileUpload, Gallery, ImagePlacement, ImageRepository, ProductRepository,
    StorageArea,
};
use crate::domain::{
    Actor, Error, ImageChanges, ImageId, NewProductImage, Product, ProductId, ProductImage,
};

/// Extensions accepted for gallery uploads.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

fn image_not_found(id: ImageId) -> Error {
    Error::not_found(format!("image {id} not found"))
}

/// Service implementing the [`Gallery`] driving port.
pub struct GalleryService<I, P, S> {
    images: Arc<I>,
    products: Arc<P>,
    storage: Arc<S>,
}

impl<I, P, S> GalleryService<I, P, S> {
    /// Create a service from its collaborators.
    pub fn new(images: Arc<I>, products: Arc<P>, storage: Arc<S>) -> Self {
        Self {
            images,
            products,
            storage,
        }
    }
}

impl<I, P, S> GalleryService<I, P, S>
where
    I: ImageRepository,
    P: ProductRepository,
    S: FileStorage,
{
    async fn load_product(&self, id: ProductId) -> Result<Product, Error> {
        self.products
            .find(id)
            .await
            .map_err(map_product_error)?
            .ok_or_else(|| Error::not_found(format!("product {id} not found")))
    }

    async fn ensure_manages(&self, actor: Actor, product_id: ProductId) -> Result<(), Error> {
        let product = self.load_product(product_id).await?;
        if product.is_owned_by(actor.id) || actor.is_admin() {
            Ok(())
        } else {
            Err(Error::forbidden(
                "only the seller or an administrator can manage this gallery",
            ))
        }
    }

    async fn load_managed_image(&self, actor: Actor, id: ImageId) -> Result<ProductImage, Error> {
        let image = self
            .images
            .find(id)
            .await
            .map_err(map_image_error)?
            .ok_or_else(|| image_not_found(id))?;
        self.ensure_manages(actor, image.product_id).await?;
        Ok(image)
    }

    async fn discard_file(&self, path: &str) {
        if let Err(error) = self.storage.remove(path).await {
            warn!(%path, %error, "failed to remove stored image");
        }
    }
}

#[async_trait]
impl<I, P, S> Gallery for GalleryService<I, P, S>
where
    I: ImageRepository,
    P: ProductRepository,
    S: FileStorage,
{
    async fn list(&self, product_id: ProductId) -> Result<Vec<ProductImage>, Error> {
        self.load_product(product_id).await?;
        self.images
            .list_for_product(product_id)
            .await
            .map_err(map_image_error)
    }

    async fn add(
        &self,
        actor: Actor,
        product_id: ProductId,
        upload: FileUpload,
        placement: ImagePlacement,
    ) -> Result<ProductImage, Error> {
        self.ensure_manages(actor, product_id).await?;
        if upload.contents.is_empty() {
            return Err(Error::invalid_request("imagen must not be empty"));
        }
        match upload.extension() {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => {
                return Err(Error::invalid_request(format!(
                    "imagen must be one of: {}",
                    IMAGE_EXTENSIONS.join(", ")
                )));
            }
        }

        let path = self
            .storage
            .store(StorageArea::Images, upload)
            .await
            .map_err(map_storage_error)?;
        let new_image = NewProductImage {
            product_id,
            path,
            order: placement.order,
            is_cover: placement.is_cover,
        };
        match self.images.add(&new_image).await {
            Ok(image) => {
                info!(image_id = %image.id, %product_id, cover = image.is_cover, "image added");
                Ok(image)
            }
            Err(error) => {
                self.discard_file(&new_image.path).await;
                Err(map_image_error(error))
            }
        }
    }

    async fn update(
        &self,
        actor: Actor,
        id: ImageId,
        changes: ImageChanges,
    ) -> Result<ProductImage, Error> {
        let image = self.load_managed_image(actor, id).await?;
        if changes.order.is_none() && changes.is_cover.is_none() {
            return Err(Error::invalid_request("no fields to update"));
        }
        if image.is_cover && changes.is_cover == Some(false) {
            return Err(Error::invalid_request(
                "a gallery always keeps one cover; promote another image instead",
            ));
        }
        self.images
            .update(id, changes)
            .await
            .map_err(map_image_error)?
            .ok_or_else(|| image_not_found(id))
    }

    async fn set_cover(&self, actor: Actor, id: ImageId) -> Result<ProductImage, Error> {
        self.load_managed_image(actor, id).await?;
        self.images
            .set_cover(id)
            .await
            .map_err(map_image_error)?
            .ok_or_else(|| image_not_found(id))
    }

    async fn reorder(
        &self,
        actor: Actor,
        product_id: ProductId,
        order: Vec<ImageId>,
    ) -> Result<Vec<ProductImage>, Error> {
        self.ensure_manages(actor, product_id).await?;
        if order.is_empty() {
            return Err(Error::invalid_request("orden must not be empty"));
        }
        let distinct: HashSet<_> = order.iter().collect();
        if distinct.len() != order.len() {
            return Err(Error::invalid_request("orden must not repeat images"));
        }
        self.images
            .reorder(product_id, &order)
            .await
            .map_err(map_image_error)
    }

    async fn delete(&self, actor: Actor, id: ImageId) -> Result<(), Error> {
        self.load_managed_image(actor, id).await?;
        let removal = self
            .images
            .remove(id)
            .await
            .map_err(map_image_error)?
            .ok_or_else(|| image_not_found(id))?;
        self.discard_file(&removal.path).await;
        info!(image_id = %id, promoted = ?removal.promoted, "image deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "gallery_service_tests.rs"]
mod tests;
