//! Purchase, PayPal capture, and transaction-detail handlers.
//!
//! ```text
//! GET /api/transacciones?id_estado=2
//! POST /api/transacciones {"id_metodo_pago":1,"archivos":[3,4]}
//! POST /api/transacciones/paypal {"id_orden_paypal":"5O190127TN364715T","archivos":[3],"monto":"12.50"}
//! PUT /api/transacciones/9/estado {"id_estado":4}
//! GET /api/transacciones/compras/3
//! GET /api/detalle-transacciones/ventas
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use pagination::Page;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CatalogId, Checkout, DetailId, Error, PaypalCapture, Price, ProductId, SaleLine,
    Transaction, TransactionDetail, TransactionFilter, TransactionId, UserId,
};

use super::ApiResult;
use super::auth::AuthenticatedUser;
use super::schemas::{PurchaseCheckBody, SaleLinePage, TransactionPage};
use super::state::HttpState;
use super::validation::{PageQuery, page_request};

/// Query parameters for `GET /api/transacciones`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionListQuery {
    /// Buyer filter; ignored for non-administrators, who only see their own.
    pub id_usuario: Option<i32>,
    pub id_estado: Option<i32>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Request body for `POST /api/transacciones`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CheckoutRequest {
    pub id_metodo_pago: i32,
    /// Products to buy, each at most once.
    #[schema(value_type = Vec<i32>)]
    pub archivos: Vec<ProductId>,
    /// Optional external payment reference.
    pub referencia_pago: Option<String>,
}

impl From<CheckoutRequest> for Checkout {
    fn from(value: CheckoutRequest) -> Self {
        Self {
            payment_method_id: CatalogId::new(value.id_metodo_pago),
            product_ids: value.archivos,
            reference: value.referencia_pago,
        }
    }
}

/// Request body for `POST /api/transacciones/paypal`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PaypalCaptureRequest {
    /// PayPal order id returned by the JS SDK.
    #[schema(example = "5O190127TN364715T")]
    pub id_orden_paypal: String,
    #[schema(value_type = Vec<i32>)]
    pub archivos: Vec<ProductId>,
    /// Amount PayPal captured.
    #[schema(value_type = String, example = "12.50")]
    pub monto: Price,
}

impl From<PaypalCaptureRequest> for PaypalCapture {
    fn from(value: PaypalCaptureRequest) -> Self {
        Self {
            order_id: value.id_orden_paypal,
            product_ids: value.archivos,
            amount: value.monto,
        }
    }
}

/// Request body for `PUT /api/transacciones/{id}/estado`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StatusChangeRequest {
    pub id_estado: i32,
}

/// Transactions: all for administrators, the caller's own otherwise.
#[utoipa::path(
    get,
    path = "/api/transacciones",
    params(TransactionListQuery),
    responses(
        (status = 200, description = "Transactions", body = TransactionPage),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "listTransactions"
)]
#[get("/api/transacciones")]
pub async fn list_transactions(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<TransactionListQuery>,
) -> ApiResult<web::Json<Page<Transaction>>> {
    let page = page_request(query.page, query.limit)?;
    let filter = TransactionFilter {
        buyer_id: query.id_usuario.map(UserId::new),
        status_id: query.id_estado.map(CatalogId::new),
    };
    Ok(web::Json(
        state.purchases.list(user.actor(), filter, page).await?,
    ))
}

/// Create a pending purchase.
#[utoipa::path(
    post,
    path = "/api/transacciones",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Created", body = Transaction),
        (status = 400, description = "Empty, repeated, or unavailable products", body = Error),
        (status = 409, description = "Reference already recorded", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "createTransaction"
)]
#[post("/api/transacciones")]
pub async fn create_transaction(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CheckoutRequest>,
) -> ApiResult<HttpResponse> {
    let transaction = state
        .purchases
        .checkout(user.actor(), payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(transaction))
}

/// Record a completed PayPal checkout.
#[utoipa::path(
    post,
    path = "/api/transacciones/paypal",
    request_body = PaypalCaptureRequest,
    responses(
        (status = 201, description = "Recorded", body = Transaction),
        (status = 400, description = "Amount mismatch or unavailable products", body = Error),
        (status = 409, description = "Order already recorded", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "recordPaypalCapture"
)]
#[post("/api/transacciones/paypal")]
pub async fn record_paypal(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<PaypalCaptureRequest>,
) -> ApiResult<HttpResponse> {
    let transaction = state
        .purchases
        .record_paypal(user.actor(), payload.into_inner().into())
        .await?;
    Ok(HttpResponse::Created().json(transaction))
}

/// Whether the caller holds a completed purchase of a product.
#[utoipa::path(
    get,
    path = "/api/transacciones/compras/{id_archivo}",
    params(("id_archivo" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Purchase check", body = PurchaseCheckBody)
    ),
    tags = ["transactions"],
    operation_id = "hasPurchased"
)]
#[get("/api/transacciones/compras/{id_archivo}")]
pub async fn has_purchased(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
) -> ApiResult<web::Json<serde_json::Value>> {
    let purchased = state
        .purchases
        .has_purchased(user.actor(), path.into_inner())
        .await?;
    Ok(web::Json(json!({ "comprado": purchased })))
}

/// One transaction with its lines (buyer or administrator).
#[utoipa::path(
    get,
    path = "/api/transacciones/{id}",
    params(("id" = i32, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction", body = Transaction),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "getTransaction"
)]
#[get("/api/transacciones/{id}")]
pub async fn get_transaction(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<TransactionId>,
) -> ApiResult<web::Json<Transaction>> {
    Ok(web::Json(
        state.purchases.get(user.actor(), path.into_inner()).await?,
    ))
}

/// Change a transaction's status (administrators).
#[utoipa::path(
    put,
    path = "/api/transacciones/{id}/estado",
    params(("id" = i32, Path, description = "Transaction id")),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Updated", body = Transaction),
        (status = 400, description = "Unknown status", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "updateTransactionStatus"
)]
#[put("/api/transacciones/{id}/estado")]
pub async fn update_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<TransactionId>,
    payload: web::Json<StatusChangeRequest>,
) -> ApiResult<web::Json<Transaction>> {
    let actor = user.require_admin()?;
    let status = CatalogId::new(payload.id_estado);
    Ok(web::Json(
        state
            .purchases
            .update_status(actor, path.into_inner(), status)
            .await?,
    ))
}

/// Lines of one transaction.
#[utoipa::path(
    get,
    path = "/api/detalle-transacciones/transaccion/{id}",
    params(("id" = i32, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Lines", body = [TransactionDetail]),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "listTransactionDetails"
)]
#[get("/api/detalle-transacciones/transaccion/{id}")]
pub async fn transaction_details(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<TransactionId>,
) -> ApiResult<web::Json<Vec<TransactionDetail>>> {
    Ok(web::Json(
        state
            .purchases
            .details(user.actor(), path.into_inner())
            .await?,
    ))
}

/// Lines sold by the caller.
#[utoipa::path(
    get,
    path = "/api/detalle-transacciones/ventas",
    params(PageQuery),
    responses(
        (status = 200, description = "Sold lines", body = SaleLinePage),
        (status = 403, description = "Not a seller", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "listSales"
)]
#[get("/api/detalle-transacciones/ventas")]
pub async fn list_sales(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<SaleLine>>> {
    let page = query.to_request()?;
    Ok(web::Json(state.purchases.sales(user.actor(), page).await?))
}

/// One line, visible to its buyer, its seller, and administrators.
#[utoipa::path(
    get,
    path = "/api/detalle-transacciones/{id}",
    params(("id" = i32, Path, description = "Line id")),
    responses(
        (status = 200, description = "Line", body = TransactionDetail),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "getTransactionDetail"
)]
#[get("/api/detalle-transacciones/{id}")]
pub async fn get_detail(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<DetailId>,
) -> ApiResult<web::Json<TransactionDetail>> {
    Ok(web::Json(
        state.purchases.detail(user.actor(), path.into_inner()).await?,
    ))
}

#[cfg(test)]
#[path = "transactions_tests.rs"]
mod tests;
