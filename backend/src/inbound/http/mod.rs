//! HTTP inbound adapter exposing the REST endpoints.
//!
//! Handlers depend only on the driving ports bundled in [`state::HttpState`]
//! and return [`ApiResult`], so domain errors map to JSON responses in one
//! place ([`error`]).

pub mod accounts;
pub mod auth;
pub mod catalogs;
pub mod error;
pub mod health;
pub mod images;
mod multipart;
pub mod products;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod transactions;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every API route.
///
/// Literal segments (`mis-archivos`, `paypal`, `ventas`) are registered ahead
/// of the `{id}` routes they would otherwise collide with.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(accounts::register)
        .service(accounts::login)
        .service(accounts::current_user)
        .service(users::list_users)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::change_password)
        .service(users::delete_user)
        .service(products::list_products)
        .service(products::list_my_products)
        .service(products::create_product)
        .service(products::download_product)
        .service(products::get_product)
        .service(products::update_product)
        .service(products::delete_product)
        .service(images::list_images)
        .service(images::add_image)
        .service(images::reorder_images)
        .service(images::set_cover)
        .service(images::update_image)
        .service(images::delete_image)
        .service(transactions::list_transactions)
        .service(transactions::create_transaction)
        .service(transactions::record_paypal)
        .service(transactions::has_purchased)
        .service(transactions::get_transaction)
        .service(transactions::update_status)
        .service(transactions::transaction_details)
        .service(transactions::list_sales)
        .service(transactions::get_detail)
        .configure(catalogs::configure);
}
