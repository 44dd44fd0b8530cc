//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every REST path, the domain schemas, and the bearer
//! token security scheme. Swagger UI serves it in debug builds and the
//! `openapi-dump` binary writes it out for client generation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::AuthSession;
use crate::domain::{
    Error, ErrorCode, Product, ProductDetail, ProductImage, SaleLine, Transaction,
    TransactionDetail, User,
};
use crate::inbound::http::accounts::{LoginRequest, RegisterRequest};
use crate::inbound::http::catalogs::CatalogNameRequest;
use crate::inbound::http::images::{ReorderImagesRequest, UpdateImageRequest};
use crate::inbound::http::products::UpdateProductRequest;
use crate::inbound::http::schemas::{
    CatalogRecordSchema, ImageUploadForm, ProductDeletionBody, ProductPage, ProductUploadForm,
    PurchaseCheckBody, SaleLinePage, TransactionPage, UserPage,
};
use crate::inbound::http::transactions::{
    CheckoutRequest, PaypalCaptureRequest, StatusChangeRequest,
};
use crate::inbound::http::users::{ChangePasswordRequest, UpdateUserRequest};

/// Name of the bearer security scheme.
pub const BEARER_SCHEME: &str = "bearer";

/// Adds the JWT bearer security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            BEARER_SCHEME,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Token returned by POST /api/auth/login."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Mercado API",
        description = "Marketplace for digital files: catalog, uploads, purchases, and PayPal checkout."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("bearer" = [])),
    paths(
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::change_password,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::catalogs::list_entries,
        crate::inbound::http::catalogs::get_entry,
        crate::inbound::http::catalogs::create_entry,
        crate::inbound::http::catalogs::rename_entry,
        crate::inbound::http::catalogs::delete_entry,
        crate::inbound::http::products::list_products,
        crate::inbound::http::products::list_my_products,
        crate::inbound::http::products::get_product,
        crate::inbound::http::products::create_product,
        crate::inbound::http::products::update_product,
        crate::inbound::http::products::delete_product,
        crate::inbound::http::products::download_product,
        crate::inbound::http::images::list_images,
        crate::inbound::http::images::add_image,
        crate::inbound::http::images::reorder_images,
        crate::inbound::http::images::update_image,
        crate::inbound::http::images::set_cover,
        crate::inbound::http::images::delete_image,
        crate::inbound::http::transactions::list_transactions,
        crate::inbound::http::transactions::create_transaction,
        crate::inbound::http::transactions::record_paypal,
        crate::inbound::http::transactions::has_purchased,
        crate::inbound::http::transactions::get_transaction,
        crate::inbound::http::transactions::update_status,
        crate::inbound::http::transactions::transaction_details,
        crate::inbound::http::transactions::list_sales,
        crate::inbound::http::transactions::get_detail,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        AuthSession,
        Product,
        ProductDetail,
        ProductImage,
        Transaction,
        TransactionDetail,
        SaleLine,
        UserPage,
        ProductPage,
        TransactionPage,
        SaleLinePage,
        CatalogRecordSchema,
        ProductUploadForm,
        ImageUploadForm,
        ProductDeletionBody,
        PurchaseCheckBody,
        RegisterRequest,
        LoginRequest,
        UpdateUserRequest,
        ChangePasswordRequest,
        CatalogNameRequest,
        UpdateProductRequest,
        UpdateImageRequest,
        ReorderImagesRequest,
        CheckoutRequest,
        PaypalCaptureRequest,
        StatusChangeRequest,
    )),
    tags(
        (name = "auth", description = "Registration and bearer tokens"),
        (name = "users", description = "Profiles and user administration"),
        (name = "catalogs", description = "Lookup tables"),
        (name = "products", description = "Files for sale"),
        (name = "images", description = "Product galleries"),
        (name = "transactions", description = "Purchases, PayPal captures, and sales"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
