//! Purchases (`transacciones`) and their line items
//! (`detalle_transaccion`).

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{CatalogId, DetailId, Price, ProductId, TransactionId, UserId};

/// Seeded status for purchases awaiting payment.
pub const STATUS_PENDING: CatalogId = CatalogId::new(1);
/// Seeded status for paid purchases; grants download access.
pub const STATUS_COMPLETED: CatalogId = CatalogId::new(2);
/// Seeded status for cancelled purchases.
pub const STATUS_CANCELLED: CatalogId = CatalogId::new(3);
/// Seeded status for refunded purchases.
pub const STATUS_REFUNDED: CatalogId = CatalogId::new(4);
/// Name of the seeded PayPal payment method row.
pub const PAYPAL_METHOD_NAME: &str = "PayPal";
/// Id of the seeded PayPal payment method row.
pub const PAYPAL_METHOD_ID: CatalogId = CatalogId::new(1);
/// Longest accepted external payment reference.
pub const REFERENCE_MAX: usize = 255;

/// Purchase header with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Transaction {
    /// Transaction id.
    #[serde(rename = "id_transaccion")]
    #[schema(value_type = i32)]
    pub id: TransactionId,
    /// Buyer.
    #[serde(rename = "id_usuario")]
    #[schema(value_type = i32)]
    pub buyer_id: UserId,
    /// Buyer display name.
    #[serde(rename = "comprador")]
    pub buyer_name: String,
    /// Payment method id.
    #[serde(rename = "id_metodo_pago")]
    #[schema(value_type = i32)]
    pub payment_method_id: CatalogId,
    /// Payment method name.
    #[serde(rename = "metodo_pago")]
    pub payment_method_name: String,
    /// Status id.
    #[serde(rename = "id_estado")]
    #[schema(value_type = i32)]
    pub status_id: CatalogId,
    /// Status name.
    #[serde(rename = "estado")]
    pub status_name: String,
    /// Sum of line prices.
    #[serde(rename = "total")]
    #[schema(value_type = String, example = "25.00")]
    pub total: Price,
    /// External payment reference, such as a PayPal order id.
    #[serde(rename = "referencia_pago")]
    pub reference: Option<String>,
    /// Creation timestamp.
    #[serde(rename = "fecha_transaccion")]
    pub created_at: DateTime<Utc>,
    /// Line items.
    #[serde(rename = "detalles")]
    pub details: Vec<TransactionDetail>,
}

/// One purchased product within a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransactionDetail {
    /// Line id.
    #[serde(rename = "id_detalle")]
    #[schema(value_type = i32)]
    pub id: DetailId,
    /// Owning transaction.
    #[serde(rename = "id_transaccion")]
    #[schema(value_type = i32)]
    pub transaction_id: TransactionId,
    /// Purchased product.
    #[serde(rename = "id_archivo")]
    #[schema(value_type = i32)]
    pub product_id: ProductId,
    /// Product name at read time.
    #[serde(rename = "nombre_archivo")]
    pub product_name: String,
    /// Price paid.
    #[serde(rename = "precio_unitario")]
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Price,
}

/// A sold line as seen by the seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SaleLine {
    /// Line item.
    #[serde(flatten)]
    pub detail: TransactionDetail,
    /// Buyer display name.
    #[serde(rename = "comprador")]
    pub buyer_name: String,
    /// Status name of the owning transaction.
    #[serde(rename = "estado")]
    pub status_name: String,
    /// Purchase timestamp.
    #[serde(rename = "fecha_transaccion")]
    pub purchased_at: DateTime<Utc>,
}

/// Line item plus the parties allowed to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
    /// Line item.
    pub detail: TransactionDetail,
    /// Buyer of the owning transaction.
    pub buyer_id: UserId,
    /// User account of the product's seller.
    pub seller_user_id: UserId,
}

/// Generic checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    /// Payment method row.
    pub payment_method_id: CatalogId,
    /// Products to purchase.
    pub product_ids: Vec<ProductId>,
    /// Optional external reference.
    pub reference: Option<String>,
}

/// Result of a PayPal checkout reported by the browser SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaypalCapture {
    /// PayPal order id; recorded as the payment reference.
    pub order_id: String,
    /// Products paid for.
    pub product_ids: Vec<ProductId>,
    /// Amount PayPal reports as captured.
    pub amount: Price,
}

/// Row values for a new transaction and its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Buyer.
    pub buyer_id: UserId,
    /// Payment method row.
    pub payment_method_id: CatalogId,
    /// Initial status.
    pub status_id: CatalogId,
    /// Sum of line prices.
    pub total: Price,
    /// External payment reference.
    pub reference: Option<String>,
    /// Product and price paid per line.
    pub lines: Vec<(ProductId, Price)>,
}

/// Listing filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Restrict to one buyer.
    pub buyer_id: Option<UserId>,
    /// Restrict to one status.
    pub status_id: Option<CatalogId>,
}
