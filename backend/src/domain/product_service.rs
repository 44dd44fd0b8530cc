//! Product listing, upload, maintenance, and download authorisation.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::{info, warn};

use crate::domain::port_errors::{
    map_catalog_error, map_image_error, map_product_error, map_storage_error,
    map_transaction_error,
};
use crate::domain::ports::{
    CatalogRepository, FileStorage, FileUpload, ImageRepository, ProductRepository, Products,
    StorageArea, TransactionRepository,
};
use crate::domain::{
    Actor, CatalogEntry, CatalogId, CatalogKind, Download, Error, NewProduct, Product,
    ProductChanges, ProductDeletion, ProductDetail, ProductDraft, ProductFilter, ProductId,
    ProductRemoval,
};

fn product_not_found(id: ProductId) -> Error {
    Error::not_found(format!("product {id} not found"))
}

/// Lowercased extension of a stored file path.
fn stored_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Attachment name offered to the browser: the product name with anything
/// outside `[A-Za-z0-9 _-]` replaced, plus the catalog extension.
fn attachment_name(product: &Product) -> String {
    let stem: String = product
        .name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.{}", stem.trim(), product.extension_name)
}

/// Service implementing the [`Products`] driving port.
pub struct ProductService<P, I, C, T, S> {
    products: Arc<P>,
    images: Arc<I>,
    catalogs: Arc<C>,
    transactions: Arc<T>,
    storage: Arc<S>,
}

impl<P, I, C, T, S> ProductService<P, I, C, T, S> {
    /// Create a service from its collaborators.
    pub fn new(
        products: Arc<P>,
        images: Arc<I>,
        catalogs: Arc<C>,
        transactions: Arc<T>,
        storage: Arc<S>,
    ) -> Self {
        Self {
            products,
            images,
            catalogs,
            transactions,
            storage,
        }
    }
}

impl<P, I, C, T, S> ProductService<P, I, C, T, S>
where
    P: ProductRepository,
    I: ImageRepository,
    C: CatalogRepository,
    T: TransactionRepository,
    S: FileStorage,
{
    async fn load(&self, id: ProductId) -> Result<Product, Error> {
        self.products
            .find(id)
            .await
            .map_err(map_product_error)?
            .ok_or_else(|| product_not_found(id))
    }

    async fn load_managed(&self, actor: Actor, id: ProductId) -> Result<Product, Error> {
        let product = self.load(id).await?;
        if product.is_owned_by(actor.id) || actor.is_admin() {
            Ok(product)
        } else {
            Err(Error::forbidden("only the seller or an administrator can manage this product"))
        }
    }

    async fn catalog_entry(&self, kind: CatalogKind, id: CatalogId) -> Result<CatalogEntry, Error> {
        self.catalogs
            .find(kind, id)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(|| Error::invalid_request(format!("unknown {kind}: {id}")))
    }

    async fn discard_file(&self, path: &str) {
        if let Err(error) = self.storage.remove(path).await {
            warn!(%path, %error, "failed to remove stored file");
        }
    }
}

#[async_trait]
impl<P, I, C, T, S> Products for ProductService<P, I, C, T, S>
where
    P: ProductRepository,
    I: ImageRepository,
    C: CatalogRepository,
    T: TransactionRepository,
    S: FileStorage,
{
    async fn list(
        &self,
        mut filter: ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, Error> {
        filter
            .validate()
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        filter.include_inactive = false;
        self.products
            .list(&filter, page)
            .await
            .map_err(map_product_error)
    }

    async fn list_mine(&self, actor: Actor, page: PageRequest) -> Result<Page<Product>, Error> {
        let filter = ProductFilter {
            seller_user_id: Some(actor.id),
            include_inactive: true,
            ..ProductFilter::default()
        };
        self.products
            .list(&filter, page)
            .await
            .map_err(map_product_error)
    }

    async fn get(&self, viewer: Option<Actor>, id: ProductId) -> Result<ProductDetail, Error> {
        let product = self.load(id).await?;
        let privileged =
            viewer.is_some_and(|actor| product.is_owned_by(actor.id) || actor.is_admin());
        if !product.active && !privileged {
            return Err(product_not_found(id));
        }
        let images = self
            .images
            .list_for_product(id)
            .await
            .map_err(map_image_error)?;
        Ok(ProductDetail { product, images })
    }

    async fn create(
        &self,
        actor: Actor,
        draft: ProductDraft,
        upload: FileUpload,
    ) -> Result<Product, Error> {
        if !actor.role.can_sell() {
            return Err(Error::forbidden("only sellers can upload products"));
        }
        if upload.contents.is_empty() {
            return Err(Error::invalid_request("archivo must not be empty"));
        }
        self.catalog_entry(CatalogKind::Category, draft.category_id)
            .await?;
        let extension = self
            .catalog_entry(CatalogKind::Extension, draft.extension_id)
            .await?;
        if upload.extension().as_deref() != Some(extension.name.as_str()) {
            return Err(Error::invalid_request(format!(
                "uploaded file must have the .{} extension",
                extension.name
            )));
        }

        let file_path = self
            .storage
            .store(StorageArea::Products, upload)
            .await
            .map_err(map_storage_error)?;
        let new_product = NewProduct {
            seller_user_id: actor.id,
            draft,
            file_path,
        };
        match self.products.create(&new_product).await {
            Ok(product) => {
                info!(product_id = %product.id, seller = %actor.id, "product created");
                Ok(product)
            }
            Err(error) => {
                self.discard_file(&new_product.file_path).await;
                Err(map_product_error(error))
            }
        }
    }

    async fn update(
        &self,
        actor: Actor,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, Error> {
        let product = self.load_managed(actor, id).await?;
        if changes.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        if let Some(category_id) = changes.category_id {
            self.catalog_entry(CatalogKind::Category, category_id)
                .await?;
        }
        if let Some(extension_id) = changes.extension_id {
            let extension = self
                .catalog_entry(CatalogKind::Extension, extension_id)
                .await?;
            if stored_extension(&product.file_path).as_deref() != Some(extension.name.as_str()) {
                return Err(Error::invalid_request(format!(
                    "stored file does not have the .{} extension",
                    extension.name
                )));
            }
        }
        self.products
            .update(id, &changes)
            .await
            .map_err(map_product_error)?
            .ok_or_else(|| product_not_found(id))
    }

    async fn delete(&self, actor: Actor, id: ProductId) -> Result<ProductDeletion, Error> {
        self.load_managed(actor, id).await?;
        let removal = self
            .products
            .remove(id)
            .await
            .map_err(map_product_error)?
            .ok_or_else(|| product_not_found(id))?;
        match removal {
            ProductRemoval::Deactivated => {
                info!(product_id = %id, "product deactivated; purchases reference it");
                Ok(ProductDeletion::Deactivated)
            }
            ProductRemoval::Deleted {
                file_path,
                image_paths,
            } => {
                self.discard_file(&file_path).await;
                for path in &image_paths {
                    self.discard_file(path).await;
                }
                info!(product_id = %id, images = image_paths.len(), "product deleted");
                Ok(ProductDeletion::Deleted)
            }
        }
    }

    async fn download(&self, actor: Actor, id: ProductId) -> Result<Download, Error> {
        let product = self.load(id).await?;
        let allowed = product.is_owned_by(actor.id)
            || actor.is_admin()
            || self
                .transactions
                .has_completed_purchase(actor.id, id)
                .await
                .map_err(map_transaction_error)?;
        if !allowed {
            return Err(Error::forbidden("purchase this product to download it"));
        }

        let path = self
            .storage
            .locate(&product.file_path)
            .map_err(map_storage_error)?;
        Ok(Download {
            path,
            file_name: attachment_name(&product),
        })
    }

    async fn record_download(&self, id: ProductId) -> Result<(), Error> {
        self.products
            .increment_downloads(id)
            .await
            .map_err(map_product_error)
    }
}

#[cfg(test)]
#[path = "product_service_tests.rs"]
mod tests;
