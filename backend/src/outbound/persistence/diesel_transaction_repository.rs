//! PostgreSQL-backed `TransactionRepository` implementation using Diesel ORM.
//!
//! A purchase header and its line items are written in one transaction.
//! Payment references are unique when present; the partial index
//! `transacciones_referencia_pago_key` enforces it and the adapter reports
//! violations as [`TransactionRepositoryError::DuplicateReference`].

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::{Page, PageRequest};

use crate::domain::ports::{TransactionRepository, TransactionRepositoryError};
use crate::domain::{
    CatalogId, DetailId, DetailRecord, NewTransaction, Price, ProductId, STATUS_COMPLETED,
    SaleLine, Transaction, TransactionDetail, TransactionFilter, TransactionId, UserId,
};

use super::error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, row_total, unique_violation,
};
use super::models::{DetailRow, NewDetailRow, NewTransactionRow, TransactionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{
    archivos, detalle_transaccion, estado_transaccion, metodos_pago, transacciones, usuarios,
    vendedor,
};

/// `transacciones` joined with the names a response shows.
macro_rules! transaction_source {
    () => {
        transacciones::table
            .inner_join(usuarios::table)
            .inner_join(metodos_pago::table)
            .inner_join(estado_transaccion::table)
    };
}

macro_rules! transaction_columns {
    () => {
        (
            TransactionRow::as_select(),
            usuarios::nombre,
            metodos_pago::nombre,
            estado_transaccion::nombre,
        )
    };
}

type HeaderRow = (TransactionRow, String, String, String);

/// Diesel-backed implementation of the `TransactionRepository` port.
#[derive(Clone)]
pub struct DieselTransactionRepository {
    pool: DbPool,
}

impl DieselTransactionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TransactionRepositoryError {
    map_basic_pool_error(error, |message| {
        TransactionRepositoryError::connection(message)
    })
}

fn map_diesel_error(error: diesel::result::Error) -> TransactionRepositoryError {
    map_basic_diesel_error(
        error,
        TransactionRepositoryError::query,
        TransactionRepositoryError::connection,
    )
}

fn price(cents: i64, column: &str) -> Result<Price, TransactionRepositoryError> {
    Price::from_cents(cents)
        .map_err(|err| TransactionRepositoryError::query(format!("{column}: {err}")))
}

fn to_detail(
    (row, product_name): (DetailRow, String),
) -> Result<TransactionDetail, TransactionRepositoryError> {
    Ok(TransactionDetail {
        id: DetailId::new(row.id_detalle),
        transaction_id: TransactionId::new(row.id_transaccion),
        product_id: ProductId::new(row.id_archivo),
        product_name,
        unit_price: price(
            row.precio_unitario_centavos,
            "detalle_transaccion.precio_unitario_centavos",
        )?,
    })
}

fn to_transaction(
    (row, buyer_name, payment_method_name, status_name): HeaderRow,
    details: &mut HashMap<i32, Vec<TransactionDetail>>,
) -> Result<Transaction, TransactionRepositoryError> {
    Ok(Transaction {
        id: TransactionId::new(row.id_transaccion),
        buyer_id: UserId::new(row.id_usuario),
        buyer_name,
        payment_method_id: CatalogId::new(row.id_metodo_pago),
        payment_method_name,
        status_id: CatalogId::new(row.id_estado),
        status_name,
        total: price(row.total_centavos, "transacciones.total_centavos")?,
        reference: row.referencia_pago,
        created_at: row.fecha_transaccion,
        details: details.remove(&row.id_transaccion).unwrap_or_default(),
    })
}

/// Line items of the given transactions with their product names.
async fn load_details(
    conn: &mut AsyncPgConnection,
    transaction_ids: Vec<i32>,
) -> QueryResult<Vec<(DetailRow, String)>> {
    detalle_transaccion::table
        .inner_join(archivos::table)
        .filter(detalle_transaccion::id_transaccion.eq_any(transaction_ids))
        .select((DetailRow::as_select(), archivos::nombre))
        .order_by(detalle_transaccion::id_detalle.asc())
        .load(conn)
        .await
}

/// Attach line items to headers.
fn assemble(
    headers: Vec<HeaderRow>,
    detail_rows: Vec<(DetailRow, String)>,
) -> Result<Vec<Transaction>, TransactionRepositoryError> {
    let mut details: HashMap<i32, Vec<TransactionDetail>> = HashMap::new();
    for detail_row in detail_rows {
        let detail = to_detail(detail_row)?;
        details
            .entry(detail.transaction_id.get())
            .or_default()
            .push(detail);
    }
    headers
        .into_iter()
        .map(|header| to_transaction(header, &mut details))
        .collect()
}

async fn load_transaction(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> QueryResult<Option<(HeaderRow, Vec<(DetailRow, String)>)>> {
    let header: Option<HeaderRow> = transaction_source!()
        .filter(transacciones::id_transaccion.eq(id))
        .select(transaction_columns!())
        .first(conn)
        .await
        .optional()?;
    let Some(header) = header else {
        return Ok(None);
    };
    let details = load_details(conn, vec![id]).await?;
    Ok(Some((header, details)))
}

fn single(
    loaded: Option<(HeaderRow, Vec<(DetailRow, String)>)>,
) -> Result<Option<Transaction>, TransactionRepositoryError> {
    let Some((header, details)) = loaded else {
        return Ok(None);
    };
    Ok(assemble(vec![header], details)?.pop())
}

/// Outcome of an insert inside its transaction.
enum Created {
    Inserted(Option<(HeaderRow, Vec<(DetailRow, String)>)>),
    DuplicateReference,
}

#[async_trait]
impl TransactionRepository for DieselTransactionRepository {
    async fn list(
        &self,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> Result<Page<Transaction>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let buyer = filter.buyer_id.map(UserId::get);
        let status = filter.status_id.map(CatalogId::get);

        let mut count_query = transacciones::table.into_boxed();
        let mut query = transaction_source!()
            .select(transaction_columns!())
            .into_boxed();
        if let Some(buyer) = buyer {
            count_query = count_query.filter(transacciones::id_usuario.eq(buyer));
            query = query.filter(transacciones::id_usuario.eq(buyer));
        }
        if let Some(status) = status {
            count_query = count_query.filter(transacciones::id_estado.eq(status));
            query = query.filter(transacciones::id_estado.eq(status));
        }

        let total: i64 = count_query
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let headers: Vec<HeaderRow> = query
            .order_by((
                transacciones::fecha_transaccion.desc(),
                transacciones::id_transaccion.desc(),
            ))
            .limit(page.sql_limit())
            .offset(page.offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let ids = headers.iter().map(|(row, ..)| row.id_transaccion).collect();
        let details = load_details(&mut conn, ids)
            .await
            .map_err(map_diesel_error)?;

        let transactions = assemble(headers, details)?;
        let total = row_total(total).map_err(TransactionRepositoryError::query)?;
        Ok(Page::new(transactions, total, page))
    }

    async fn find(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let loaded = load_transaction(&mut conn, id.get())
            .await
            .map_err(map_diesel_error)?;
        single(loaded)
    }

    async fn create(
        &self,
        transaction: &NewTransaction,
    ) -> Result<Transaction, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let reference = transaction.reference.as_deref();
        let header = NewTransactionRow {
            id_usuario: transaction.buyer_id.get(),
            id_metodo_pago: transaction.payment_method_id.get(),
            id_estado: transaction.status_id.get(),
            total_centavos: transaction.total.cents(),
            referencia_pago: reference,
        };

        let outcome = conn
            .transaction(|conn| {
                async move {
                    if let Some(reference) = reference {
                        let taken: i64 = transacciones::table
                            .filter(transacciones::referencia_pago.eq(reference))
                            .count()
                            .get_result(conn)
                            .await?;
                        if taken > 0 {
                            return Ok(Created::DuplicateReference);
                        }
                    }

                    let id: i32 = diesel::insert_into(transacciones::table)
                        .values(&header)
                        .returning(transacciones::id_transaccion)
                        .get_result(conn)
                        .await?;
                    let lines: Vec<NewDetailRow> = transaction
                        .lines
                        .iter()
                        .map(|(product_id, unit_price)| NewDetailRow {
                            id_transaccion: id,
                            id_archivo: product_id.get(),
                            precio_unitario_centavos: unit_price.cents(),
                        })
                        .collect();
                    diesel::insert_into(detalle_transaccion::table)
                        .values(&lines)
                        .execute(conn)
                        .await?;
                    load_transaction(conn, id).await.map(Created::Inserted)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| match (unique_violation(&error), reference) {
                (Some(_), Some(reference)) => {
                    TransactionRepositoryError::duplicate_reference(reference)
                }
                _ => map_diesel_error(error),
            })?;

        match outcome {
            Created::DuplicateReference => Err(TransactionRepositoryError::duplicate_reference(
                reference.unwrap_or_default(),
            )),
            Created::Inserted(loaded) => single(loaded)?.ok_or_else(|| {
                TransactionRepositoryError::query("inserted transaction not found")
            }),
        }
    }

    async fn update_status(
        &self,
        id: TransactionId,
        status_id: CatalogId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(transacciones::table.find(id.get()))
            .set(transacciones::id_estado.eq(status_id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Ok(None);
        }
        let loaded = load_transaction(&mut conn, id.get())
            .await
            .map_err(map_diesel_error)?;
        single(loaded)
    }

    async fn has_completed_purchase(
        &self,
        buyer_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            detalle_transaccion::table
                .inner_join(transacciones::table)
                .filter(transacciones::id_usuario.eq(buyer_id.get()))
                .filter(transacciones::id_estado.eq(STATUS_COMPLETED.get()))
                .filter(detalle_transaccion::id_archivo.eq(product_id.get())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn find_detail(
        &self,
        id: DetailId,
    ) -> Result<Option<DetailRecord>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(DetailRow, String, i32, i32)> = detalle_transaccion::table
            .inner_join(transacciones::table)
            .inner_join(archivos::table.inner_join(vendedor::table))
            .filter(detalle_transaccion::id_detalle.eq(id.get()))
            .select((
                DetailRow::as_select(),
                archivos::nombre,
                transacciones::id_usuario,
                vendedor::id_usuario,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(detail, product_name, buyer_id, seller_user_id)| {
            Ok(DetailRecord {
                detail: to_detail((detail, product_name))?,
                buyer_id: UserId::new(buyer_id),
                seller_user_id: UserId::new(seller_user_id),
            })
        })
        .transpose()
    }

    async fn sales_for_seller(
        &self,
        seller_user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<SaleLine>, TransactionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let seller = seller_user_id.get();

        let total: i64 = detalle_transaccion::table
            .inner_join(archivos::table.inner_join(vendedor::table))
            .filter(vendedor::id_usuario.eq(seller))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<(DetailRow, String, String, String, chrono::DateTime<chrono::Utc>)> =
            detalle_transaccion::table
                .inner_join(
                    transacciones::table
                        .inner_join(usuarios::table)
                        .inner_join(estado_transaccion::table),
                )
                .inner_join(archivos::table.inner_join(vendedor::table))
                .filter(vendedor::id_usuario.eq(seller))
                .select((
                    DetailRow::as_select(),
                    archivos::nombre,
                    usuarios::nombre,
                    estado_transaccion::nombre,
                    transacciones::fecha_transaccion,
                ))
                .order_by((
                    transacciones::fecha_transaccion.desc(),
                    detalle_transaccion::id_detalle.desc(),
                ))
                .limit(page.sql_limit())
                .offset(page.offset())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;

        let sales = rows
            .into_iter()
            .map(|(detail, product_name, buyer_name, status_name, purchased_at)| {
                Ok(SaleLine {
                    detail: to_detail((detail, product_name))?,
                    buyer_name,
                    status_name,
                    purchased_at,
                })
            })
            .collect::<Result<Vec<_>, TransactionRepositoryError>>()?;
        let total = row_total(total).map_err(TransactionRepositoryError::query)?;
        Ok(Page::new(sales, total, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn header(id: i32) -> HeaderRow {
        (
            TransactionRow {
                id_transaccion: id,
                id_usuario: 4,
                id_metodo_pago: 1,
                id_estado: 2,
                total_centavos: 1500,
                referencia_pago: Some(format!("PAYPAL-{id}")),
                fecha_transaccion: Utc
                    .with_ymd_and_hms(2025, 4, 2, 9, 30, 0)
                    .single()
                    .expect("timestamp"),
            },
            "Marta".to_owned(),
            "PayPal".to_owned(),
            "Completada".to_owned(),
        )
    }

    fn line(id: i32, transaction: i32, cents: i64) -> (DetailRow, String) {
        (
            DetailRow {
                id_detalle: id,
                id_transaccion: transaction,
                id_archivo: 10 + id,
                precio_unitario_centavos: cents,
            },
            format!("Archivo {id}"),
        )
    }

    #[rstest]
    fn details_are_grouped_by_transaction() {
        let transactions = assemble(
            vec![header(1), header(2)],
            vec![line(1, 1, 1000), line(2, 1, 500), line(3, 2, 1500)],
        )
        .expect("valid rows");

        let counts: Vec<usize> = transactions.iter().map(|tx| tx.details.len()).collect();
        assert_eq!(counts, vec![2, 1]);
        assert!(
            transactions
                .iter()
                .flat_map(|tx| tx.details.iter().map(move |d| (tx.id, d.transaction_id)))
                .all(|(owner, linked)| owner == linked)
        );
    }

    #[rstest]
    fn headers_without_lines_get_empty_details() {
        let transactions = assemble(vec![header(7)], Vec::new()).expect("valid rows");
        assert!(transactions.iter().all(|tx| tx.details.is_empty()));
    }

    #[rstest]
    fn negative_line_prices_are_query_errors() {
        let error = assemble(vec![header(1)], vec![line(1, 1, -1)]).expect_err("negative");
        assert!(matches!(error, TransactionRepositoryError::Query { .. }));
    }
}
