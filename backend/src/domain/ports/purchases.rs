//! Driving port for purchases, sales, and purchase checks.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    Actor, CatalogId, Checkout, DetailId, Error, PaypalCapture, ProductId, SaleLine, Transaction,
    TransactionDetail, TransactionFilter, TransactionId,
};

/// Domain use-case port for transactions and their line items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Purchases: Send + Sync {
    /// Administrators see every transaction; other callers only their own.
    async fn list(
        &self,
        actor: Actor,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<Transaction>, Error>;

    /// One transaction (buyer or administrator).
    async fn get(&self, actor: Actor, id: TransactionId) -> Result<Transaction, Error>;

    /// Record a pending purchase priced from current product prices.
    async fn checkout(&self, actor: Actor, checkout: Checkout) -> Result<Transaction, Error>;

    /// Record a completed PayPal payment exactly once per order id.
    async fn record_paypal(
        &self,
        actor: Actor,
        capture: PaypalCapture,
    ) -> Result<Transaction, Error>;

    /// Change a transaction's status (administrators only).
    async fn update_status(
        &self,
        actor: Actor,
        id: TransactionId,
        status_id: CatalogId,
    ) -> Result<Transaction, Error>;

    /// Whether the caller completed a purchase of the product.
    async fn has_purchased(&self, actor: Actor, product_id: ProductId) -> Result<bool, Error>;

    /// Lines of a transaction (buyer or administrator).
    async fn details(
        &self,
        actor: Actor,
        id: TransactionId,
    ) -> Result<Vec<TransactionDetail>, Error>;

    /// One line (buyer, seller of the product, or administrator).
    async fn detail(&self, actor: Actor, id: DetailId) -> Result<TransactionDetail, Error>;

    /// Lines the caller sold.
    async fn sales(&self, actor: Actor, page: PageRequest) -> Result<Page<SaleLine>, Error>;
}
