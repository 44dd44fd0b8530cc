//! Port for purchases and their line items.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    CatalogId, DetailId, DetailRecord, NewTransaction, ProductId, SaleLine, Transaction,
    TransactionFilter, TransactionId, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by transaction repository adapters.
    pub enum TransactionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "transaction repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "transaction repository query failed: {message}",
        /// A transaction already carries this payment reference.
        DuplicateReference { reference: String } =>
            "payment reference already recorded: {reference}",
    }
}

/// Port for recording and reading purchases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Page through transactions, newest first.
    async fn list(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<Transaction>, TransactionRepositoryError>;

    /// One transaction with its lines.
    async fn find(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError>;

    /// Insert the header and its lines atomically. A reference already in
    /// use yields [`TransactionRepositoryError::DuplicateReference`].
    async fn create(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, TransactionRepositoryError>;

    /// Change the status; `None` when the id is unknown.
    async fn update_status(
        &self,
        id: TransactionId,
        status_id: CatalogId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError>;

    /// Whether the buyer has a completed purchase of the product.
    async fn has_completed_purchase(
        &self,
        buyer_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, TransactionRepositoryError>;

    /// One line item with its buyer and seller.
    async fn find_detail(
        &self,
        id: DetailId,
    ) -> Result<Option<DetailRecord>, TransactionRepositoryError>;

    /// Lines sold by a seller, newest first.
    async fn sales_for_seller(
        &self,
        seller_user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<SaleLine>, TransactionRepositoryError>;
}
