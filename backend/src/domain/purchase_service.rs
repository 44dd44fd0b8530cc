//! Purchases: checkout, PayPal capture recording, status changes, and the
//! buyer and seller views of line items.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::info;

use crate::domain::port_errors::{
    admin_required, map_catalog_error, map_product_error, map_transaction_error,
};
use crate::domain::ports::{CatalogRepository, ProductRepository, Purchases, TransactionRepository};
use crate::domain::{
    Actor, CatalogId, CatalogKind, Checkout, DetailId, Error, NewTransaction, PAYPAL_METHOD_NAME,
    PaypalCapture, Price, ProductId, REFERENCE_MAX, STATUS_COMPLETED, STATUS_PENDING, SaleLine,
    Transaction, TransactionDetail, TransactionFilter, TransactionId,
};

fn transaction_not_found(id: TransactionId) -> Error {
    Error::not_found(format!("transaction {id} not found"))
}

fn normalise_reference(raw: &str) -> Result<String, Error> {
    let reference = raw.trim();
    if reference.is_empty() {
        return Err(Error::invalid_request("referencia_pago must not be empty"));
    }
    if reference.chars().count() > REFERENCE_MAX {
        return Err(Error::invalid_request(format!(
            "referencia_pago must be at most {REFERENCE_MAX} characters"
        )));
    }
    Ok(reference.to_owned())
}

fn ensure_distinct(product_ids: &[ProductId]) -> Result<(), Error> {
    if product_ids.is_empty() {
        return Err(Error::invalid_request("archivos must list at least one product"));
    }
    let distinct: HashSet<_> = product_ids.iter().collect();
    if distinct.len() != product_ids.len() {
        return Err(Error::invalid_request("archivos must not repeat products"));
    }
    Ok(())
}

/// Service implementing the [`Purchases`] driving port.
pub struct PurchaseService<T, P, C> {
    transactions: Arc<T>,
    products: Arc<P>,
    catalogs: Arc<C>,
}

impl<T, P, C> PurchaseService<T, P, C> {
    /// Create a service from its collaborators.
    pub fn new(transactions: Arc<T>, products: Arc<P>, catalogs: Arc<C>) -> Self {
        Self {
            transactions,
            products,
            catalogs,
        }
    }
}

impl<T, P, C> PurchaseService<T, P, C>
where
    T: TransactionRepository,
    P: ProductRepository,
    C: CatalogRepository,
{
    /// Current price of each requested product, in request order.
    ///
    /// Unknown and inactive products are reported together in `details`.
    async fn priced_lines(
        &self,
        product_ids: &[ProductId],
    ) -> Result<(Vec<(ProductId, Price)>, Price), Error> {
        ensure_distinct(product_ids)?;
        let found: HashMap<ProductId, _> = self
            .products
            .find_many(product_ids)
            .await
            .map_err(map_product_error)?
            .into_iter()
            .filter(|product| product.active)
            .map(|product| (product.id, product.price))
            .collect();

        let mut unavailable = Vec::new();
        let mut lines = Vec::with_capacity(product_ids.len());
        let mut total = Price::ZERO;
        for id in product_ids {
            let Some(price) = found.get(id).copied() else {
                unavailable.push(*id);
                continue;
            };
            total = total
                .checked_add(price)
                .map_err(|err| Error::invalid_request(err.to_string()))?;
            lines.push((*id, price));
        }
        if !unavailable.is_empty() {
            return Err(Error::invalid_request("some products are not available")
                .with_details(json!({ "unavailable": unavailable })));
        }
        Ok((lines, total))
    }

    async fn load_visible(&self, actor: Actor, id: TransactionId) -> Result<Transaction, Error> {
        let transaction = self
            .transactions
            .find(id)
            .await
            .map_err(map_transaction_error)?
            .ok_or_else(|| transaction_not_found(id))?;
        if actor.is_self_or_admin(transaction.buyer_id) {
            Ok(transaction)
        } else {
            Err(Error::forbidden("you may only view your own purchases"))
        }
    }

    async fn record(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        let created = self
            .transactions
            .create(&transaction)
            .await
            .map_err(map_transaction_error)?;
        info!(
            transaction_id = %created.id,
            buyer = %created.buyer_id,
            status = %created.status_id,
            total = %created.total,
            lines = created.details.len(),
            "transaction recorded"
        );
        Ok(created)
    }
}

#[async_trait]
impl<T, P, C> Purchases for PurchaseService<T, P, C>
where
    T: TransactionRepository,
    P: ProductRepository,
    C: CatalogRepository,
{
    async fn list(
        &self,
        actor: Actor,
        mut filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<Transaction>, Error> {
        if !actor.is_admin() {
            filter.buyer_id = Some(actor.id);
        }
        self.transactions
            .list(filter, page)
            .await
            .map_err(map_transaction_error)
    }

    async fn get(&self, actor: Actor, id: TransactionId) -> Result<Transaction, Error> {
        self.load_visible(actor, id).await
    }

    async fn checkout(&self, actor: Actor, checkout: Checkout) -> Result<Transaction, Error> {
        self.catalogs
            .find(CatalogKind::PaymentMethod, checkout.payment_method_id)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(|| {
                Error::invalid_request(format!(
                    "unknown payment method: {}",
                    checkout.payment_method_id
                ))
            })?;
        let reference = checkout
            .reference
            .as_deref()
            .map(normalise_reference)
            .transpose()?;
        let (lines, total) = self.priced_lines(&checkout.product_ids).await?;

        self.record(NewTransaction {
            buyer_id: actor.id,
            payment_method_id: checkout.payment_method_id,
            status_id: STATUS_PENDING,
            total,
            reference,
            lines,
        })
        .await
    }

    async fn record_paypal(
        &self,
        actor: Actor,
        capture: PaypalCapture,
    ) -> Result<Transaction, Error> {
        let reference = normalise_reference(&capture.order_id)?;
        let paypal = self
            .catalogs
            .find_by_name(CatalogKind::PaymentMethod, PAYPAL_METHOD_NAME)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(|| Error::internal("PayPal payment method is not configured"))?;
        let (lines, total) = self.priced_lines(&capture.product_ids).await?;
        if total != capture.amount {
            return Err(
                Error::invalid_request("captured amount does not match the order total")
                    .with_details(json!({
                        "expected": total,
                        "received": capture.amount,
                    })),
            );
        }

        self.record(NewTransaction {
            buyer_id: actor.id,
            payment_method_id: paypal.id,
            status_id: STATUS_COMPLETED,
            total,
            reference: Some(reference),
            lines,
        })
        .await
    }

    async fn update_status(
        &self,
        actor: Actor,
        id: TransactionId,
        status_id: CatalogId,
    ) -> Result<Transaction, Error> {
        if !actor.is_admin() {
            return Err(admin_required());
        }
        self.catalogs
            .find(CatalogKind::TransactionStatus, status_id)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(|| Error::invalid_request(format!("unknown transaction status: {status_id}")))?;
        let updated = self
            .transactions
            .update_status(id, status_id)
            .await
            .map_err(map_transaction_error)?
            .ok_or_else(|| transaction_not_found(id))?;
        info!(transaction_id = %id, status = %status_id, changed_by = %actor.id, "transaction status changed");
        Ok(updated)
    }

    async fn has_purchased(&self, actor: Actor, product_id: ProductId) -> Result<bool, Error> {
        self.transactions
            .has_completed_purchase(actor.id, product_id)
            .await
            .map_err(map_transaction_error)
    }

    async fn details(
        &self,
        actor: Actor,
        id: TransactionId,
    ) -> Result<Vec<TransactionDetail>, Error> {
        Ok(self.load_visible(actor, id).await?.details)
    }

    async fn detail(&self, actor: Actor, id: DetailId) -> Result<TransactionDetail, Error> {
        let record = self
            .transactions
            .find_detail(id)
            .await
            .map_err(map_transaction_error)?
            .ok_or_else(|| Error::not_found(format!("transaction detail {id} not found")))?;
        if actor.is_self_or_admin(record.buyer_id) || actor.id == record.seller_user_id {
            Ok(record.detail)
        } else {
            Err(Error::forbidden("you are neither the buyer nor the seller of this line"))
        }
    }

    async fn sales(&self, actor: Actor, page: PageRequest) -> Result<Page<SaleLine>, Error> {
        if !actor.role.can_sell() {
            return Err(Error::forbidden("only sellers have sales"));
        }
        self.transactions
            .sales_for_seller(actor.id, page)
            .await
            .map_err(map_transaction_error)
    }
}

#[cfg(test)]
#[path = "purchase_service_tests.rs"]
mod tests;
