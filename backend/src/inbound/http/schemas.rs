//! OpenAPI-only schema definitions.
//!
//! Generic and borrowed response shapes ([`pagination::Page`],
//! [`crate::domain::CatalogRecord`]) and multipart form bodies cannot derive
//! `ToSchema` directly. The wrappers here mirror their JSON so the generated
//! document matches what handlers emit.

#![expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]

use utoipa::ToSchema;

use crate::domain::{Product, SaleLine, Transaction, User};

macro_rules! page_schema {
    ($(#[$meta:meta])* $name:ident, $item:ty) => {
        $(#[$meta])*
        #[derive(ToSchema)]
        pub struct $name {
            /// Items on this page.
            items: Vec<$item>,
            /// Matches across all pages.
            total: u64,
            /// One-based page number.
            page: u32,
            /// Page size.
            limit: u32,
            /// Number of pages.
            total_pages: u64,
        }
    };
}

page_schema!(
    /// Page of users.
    UserPage,
    User
);
page_schema!(
    /// Page of products.
    ProductPage,
    Product
);
page_schema!(
    /// Page of transactions.
    TransactionPage,
    Transaction
);
page_schema!(
    /// Page of sold lines.
    SaleLinePage,
    SaleLine
);

/// Catalog row; the id key names the table (`id_categoria`,
/// `id_extension`, `id_genero`, `id_metodo_pago`, `id_tipo_usuario`,
/// `id_estado`).
#[derive(ToSchema)]
#[schema(as = CatalogRecord, example = json!({"id_categoria": 1, "nombre": "Plantillas"}))]
pub struct CatalogRecordSchema {
    /// Display name.
    nombre: String,
}

/// `multipart/form-data` body of `POST /api/archivos`.
#[derive(ToSchema)]
pub struct ProductUploadForm {
    /// File to sell; its extension must match `id_extension`.
    #[schema(value_type = String, format = Binary)]
    archivo: Vec<u8>,
    nombre: String,
    descripcion: Option<String>,
    /// Decimal price such as `12.50`.
    precio: String,
    id_categoria: i32,
    id_extension: i32,
}

/// `multipart/form-data` body of `POST /api/imagenes/archivo/{id}`.
#[derive(ToSchema)]
pub struct ImageUploadForm {
    /// png, jpg, jpeg, gif or webp.
    #[schema(value_type = String, format = Binary)]
    imagen: Vec<u8>,
    /// Gallery position; appended when omitted.
    orden: Option<i32>,
    /// Make this the cover.
    es_portada: Option<bool>,
}

/// Outcome of `DELETE /api/archivos/{id}`.
#[derive(ToSchema)]
#[schema(example = json!({"resultado": "desactivado"}))]
pub struct ProductDeletionBody {
    /// `eliminado` or `desactivado` (kept because purchases reference it).
    resultado: String,
}

/// Body of `GET /api/transacciones/compras/{id_archivo}`.
#[derive(ToSchema)]
pub struct PurchaseCheckBody {
    comprado: bool,
}
