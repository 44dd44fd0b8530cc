//! Product gallery images (`imagenes_archivo`).
//!
//! A product with at least one image has exactly one cover (`es_portada`).
//! Repositories clear and set the flag inside one transaction so readers
//! never observe zero or two covers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ImageId, ProductId};

/// Gallery image row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProductImage {
    /// Image id.
    #[serde(rename = "id_imagen")]
    #[schema(value_type = i32)]
    pub id: ImageId,
    /// Owning product.
    #[serde(rename = "id_archivo")]
    #[schema(value_type = i32)]
    pub product_id: ProductId,
    /// Storage path relative to the uploads directory; served under
    /// `/uploads/`.
    #[serde(rename = "ruta_imagen")]
    pub path: String,
    /// Position in the gallery.
    #[serde(rename = "orden")]
    pub order: i32,
    /// Whether this is the cover image.
    #[serde(rename = "es_portada")]
    pub is_cover: bool,
    /// Upload timestamp.
    #[serde(rename = "fecha_subida")]
    pub uploaded_at: DateTime<Utc>,
}

/// Row values for a new gallery image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductImage {
    /// Owning product.
    pub product_id: ProductId,
    /// Storage path.
    pub path: String,
    /// Explicit position; appended after the last image when `None`.
    pub order: Option<i32>,
    /// Request to make this the cover. The first image always becomes the
    /// cover regardless.
    pub is_cover: bool,
}

/// Partial image update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageChanges {
    /// New position.
    pub order: Option<i32>,
    /// `Some(true)` promotes the image to cover. `Some(false)` is only
    /// accepted for images that are not the cover.
    pub is_cover: Option<bool>,
}

/// Outcome of deleting an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRemoval {
    /// Storage path of the removed file.
    pub path: String,
    /// Image promoted to cover because the removed image was the cover.
    pub promoted: Option<ImageId>,
}
