//! Products (`archivos`): digital files listed for sale.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{CatalogId, Price, ProductId, ProductImage, SellerId, UserId};

/// Maximum product name length.
pub const PRODUCT_NAME_MAX: usize = 200;
/// Maximum description length.
pub const DESCRIPTION_MAX: usize = 5000;

/// Validation errors for product input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductValidationError {
    /// The name is blank.
    #[error("nombre must not be empty")]
    EmptyName,
    /// The name is longer than [`PRODUCT_NAME_MAX`].
    #[error("nombre must be at most {max} characters")]
    NameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The description is longer than [`DESCRIPTION_MAX`].
    #[error("descripcion must be at most {max} characters")]
    DescriptionTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Unrecognised `orden` value.
    #[error("unknown sort order: {value}")]
    UnknownSort {
        /// Rejected value.
        value: String,
    },
    /// `precio_min` is above `precio_max`.
    #[error("precio_min must not exceed precio_max")]
    InvertedPriceRange,
}

/// Validate a product name.
///
/// # Errors
/// Returns [`ProductValidationError`] when blank or too long.
pub fn validate_product_name(raw: &str) -> Result<String, ProductValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProductValidationError::EmptyName);
    }
    if trimmed.chars().count() > PRODUCT_NAME_MAX {
        return Err(ProductValidationError::NameTooLong {
            max: PRODUCT_NAME_MAX,
        });
    }
    Ok(trimmed.to_owned())
}

/// Validate an optional description; blank input clears it.
///
/// # Errors
/// Returns [`ProductValidationError::DescriptionTooLong`] when too long.
pub fn validate_description(raw: Option<&str>) -> Result<Option<String>, ProductValidationError> {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > DESCRIPTION_MAX {
        return Err(ProductValidationError::DescriptionTooLong {
            max: DESCRIPTION_MAX,
        });
    }
    Ok(Some(text.to_owned()))
}

/// Product listing row joined with its seller, category, extension, and
/// cover image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Product {
    /// Product id.
    #[serde(rename = "id_archivo")]
    #[schema(value_type = i32)]
    pub id: ProductId,
    /// Seller row id.
    #[serde(rename = "id_vendedor")]
    #[schema(value_type = i32)]
    pub seller_id: SellerId,
    /// User owning the seller row.
    #[serde(rename = "id_usuario_vendedor")]
    #[schema(value_type = i32)]
    pub seller_user_id: UserId,
    /// Seller display name.
    #[serde(rename = "vendedor")]
    pub seller_name: String,
    /// Category id.
    #[serde(rename = "id_categoria")]
    #[schema(value_type = i32)]
    pub category_id: CatalogId,
    /// Category name.
    #[serde(rename = "categoria")]
    pub category_name: String,
    /// Extension id.
    #[serde(rename = "id_extension")]
    #[schema(value_type = i32)]
    pub extension_id: CatalogId,
    /// Extension name.
    #[serde(rename = "extension")]
    pub extension_name: String,
    /// Product name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Optional description.
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    /// Current price.
    #[serde(rename = "precio")]
    #[schema(value_type = String, example = "12.50")]
    pub price: Price,
    /// Storage path of the sold file; never exposed.
    #[serde(skip)]
    pub file_path: String,
    /// Upload timestamp.
    #[serde(rename = "fecha_subida")]
    pub uploaded_at: DateTime<Utc>,
    /// Download counter.
    #[serde(rename = "descargas")]
    pub downloads: i32,
    /// `false` once soft-deleted or hidden by its owner.
    #[serde(rename = "activo")]
    pub active: bool,
    /// Storage path of the cover image, if any.
    #[serde(rename = "imagen_portada")]
    pub cover_image: Option<String>,
}

impl Product {
    /// Whether `user` owns this product.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.seller_user_id == user
    }
}

/// Product plus its gallery, returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProductDetail {
    /// Product row.
    #[serde(flatten)]
    pub product: Product,
    /// Gallery ordered by `orden`.
    #[serde(rename = "imagenes")]
    pub images: Vec<ProductImage>,
}

/// Listing sort orders accepted by `orden`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Newest first (`recientes`).
    #[default]
    Recent,
    /// Cheapest first (`precio_asc`).
    PriceAsc,
    /// Most expensive first (`precio_desc`).
    PriceDesc,
    /// Most downloaded first (`populares`).
    Popular,
    /// Alphabetical (`nombre`).
    Name,
}

impl FromStr for ProductSort {
    type Err = ProductValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "recientes" => Ok(Self::Recent),
            "precio_asc" => Ok(Self::PriceAsc),
            "precio_desc" => Ok(Self::PriceDesc),
            "populares" => Ok(Self::Popular),
            "nombre" => Ok(Self::Name),
            other => Err(ProductValidationError::UnknownSort {
                value: other.to_owned(),
            }),
        }
    }
}

/// Listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    /// Restrict to a category.
    pub category_id: Option<CatalogId>,
    /// Restrict to an extension.
    pub extension_id: Option<CatalogId>,
    /// Restrict to one seller's user account.
    pub seller_user_id: Option<UserId>,
    /// Inclusive lower price bound.
    pub min_price: Option<Price>,
    /// Inclusive upper price bound.
    pub max_price: Option<Price>,
    /// Sort order.
    pub sort: ProductSort,
    /// Include soft-deleted and hidden products.
    pub include_inactive: bool,
}

impl ProductFilter {
    /// Reject inverted price ranges.
    ///
    /// # Errors
    /// Returns [`ProductValidationError::InvertedPriceRange`].
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) if min > max => Err(ProductValidationError::InvertedPriceRange),
            _ => Ok(()),
        }
    }
}

/// Validated metadata of a new upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    /// Product name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Asking price.
    pub price: Price,
    /// Category id.
    pub category_id: CatalogId,
    /// Extension id.
    pub extension_id: CatalogId,
}

/// Row values for inserting a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// User account that becomes the seller.
    pub seller_user_id: UserId,
    /// Validated metadata.
    pub draft: ProductDraft,
    /// Storage path of the uploaded file.
    pub file_path: String,
}

/// Partial product update. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    /// New name.
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// New price.
    pub price: Option<Price>,
    /// New category.
    pub category_id: Option<CatalogId>,
    /// New extension.
    pub extension_id: Option<CatalogId>,
    /// Show or hide the product.
    pub active: Option<bool>,
}

impl ProductChanges {
    /// Whether the update touches no column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category_id.is_none()
            && self.extension_id.is_none()
            && self.active.is_none()
    }
}

/// Outcome of deleting a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductRemoval {
    /// Transaction details reference the product, so it was only hidden.
    Deactivated,
    /// The row and its images were removed; the listed files can be deleted.
    Deleted {
        /// Storage path of the product file.
        file_path: String,
        /// Storage paths of gallery images.
        image_paths: Vec<String>,
    },
}

/// Outcome reported to the client after a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductDeletion {
    /// Hidden because purchases reference it.
    Deactivated,
    /// Removed together with its files.
    Deleted,
}

/// File handed to the HTTP adapter for streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Absolute path of the stored file.
    pub path: std::path::PathBuf,
    /// Suggested attachment name.
    pub file_name: String,
}
