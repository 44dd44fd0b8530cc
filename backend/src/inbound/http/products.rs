//! Product listing, upload, maintenance, and download handlers.
//!
//! ```text
//! GET /api/archivos?busqueda=cv&orden=precio_asc&page=1
//! GET /api/archivos/mis-archivos
//! POST /api/archivos (multipart: archivo, nombre, descripcion, precio, id_categoria, id_extension)
//! PUT /api/archivos/3 {"precio":"9.99","activo":false}
//! GET /api/archivos/3/descargar
//! ```

use actix_files::NamedFile;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use pagination::Page;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CatalogId, Error, Price, Product, ProductChanges, ProductDeletion, ProductDetail,
    ProductDraft, ProductFilter, ProductId, ProductSort, UserId, validate_description,
    validate_product_name,
};

use super::ApiResult;
use super::auth::AuthenticatedUser;
use super::multipart::{UploadForm, read_upload_form};
use super::schemas::{ProductDeletionBody, ProductPage, ProductUploadForm};
use super::state::HttpState;
use super::validation::{
    FieldName, PageQuery, double_option, map_product_validation_error, page_request,
    parse_i32, parse_optional_price, parse_price, require,
};

const FILE_FIELD: FieldName = FieldName::new("archivo");

/// Query parameters for `GET /api/archivos`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Case-insensitive match on name or description.
    pub busqueda: Option<String>,
    pub id_categoria: Option<i32>,
    pub id_extension: Option<i32>,
    /// Seller's user id.
    pub id_usuario_vendedor: Option<i32>,
    /// Inclusive lower bound, decimal.
    pub precio_min: Option<String>,
    /// Inclusive upper bound, decimal.
    pub precio_max: Option<String>,
    /// `recientes`, `precio_asc`, `precio_desc`, `populares` or `nombre`.
    pub orden: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductListQuery {
    fn to_filter(&self) -> Result<ProductFilter, Error> {
        let sort = match self.orden.as_deref().map(str::trim) {
            None | Some("") => ProductSort::default(),
            Some(raw) => raw.parse().map_err(map_product_validation_error)?,
        };
        let filter = ProductFilter {
            search: self
                .busqueda
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_owned),
            category_id: self.id_categoria.map(CatalogId::new),
            extension_id: self.id_extension.map(CatalogId::new),
            seller_user_id: self.id_usuario_vendedor.map(UserId::new),
            min_price: parse_optional_price(self.precio_min.as_deref(), FieldName::new("precio_min"))?,
            max_price: parse_optional_price(self.precio_max.as_deref(), FieldName::new("precio_max"))?,
            sort,
            include_inactive: false,
        };
        filter.validate().map_err(map_product_validation_error)?;
        Ok(filter)
    }
}

/// Request body for `PUT /api/archivos/{id}`. Absent keys are left
/// unchanged; `"descripcion": null` clears the description.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateProductRequest {
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub descripcion: Option<Option<String>>,
    #[schema(value_type = Option<String>, example = "12.50")]
    pub precio: Option<Price>,
    pub id_categoria: Option<i32>,
    pub id_extension: Option<i32>,
    /// Hide (`false`) or relist (`true`) the product.
    pub activo: Option<bool>,
}

impl TryFrom<UpdateProductRequest> for ProductChanges {
    type Error = Error;

    fn try_from(value: UpdateProductRequest) -> Result<Self, Self::Error> {
        let description = match value.descripcion {
            Some(raw) => Some(validate_description(raw.as_deref()).map_err(map_product_validation_error)?),
            None => None,
        };
        Ok(Self {
            name: value
                .nombre
                .as_deref()
                .map(validate_product_name)
                .transpose()
                .map_err(map_product_validation_error)?,
            description,
            price: value.precio,
            category_id: value.id_categoria.map(CatalogId::new),
            extension_id: value.id_extension.map(CatalogId::new),
            active: value.activo,
        })
    }
}

fn draft_from_form(form: &UploadForm) -> Result<ProductDraft, Error> {
    let name = require(form.text(FieldName::new("nombre")), FieldName::new("nombre"))?;
    let price = require(form.text(FieldName::new("precio")), FieldName::new("precio"))?;
    let category = require(form.text(FieldName::new("id_categoria")), FieldName::new("id_categoria"))?;
    let extension = require(form.text(FieldName::new("id_extension")), FieldName::new("id_extension"))?;
    Ok(ProductDraft {
        name: validate_product_name(name).map_err(map_product_validation_error)?,
        description: validate_description(form.raw(FieldName::new("descripcion")))
            .map_err(map_product_validation_error)?,
        price: parse_price(price, FieldName::new("precio"))?,
        category_id: CatalogId::new(parse_i32(category, FieldName::new("id_categoria"))?),
        extension_id: CatalogId::new(parse_i32(extension, FieldName::new("id_extension"))?),
    })
}

fn deletion_body(outcome: ProductDeletion) -> serde_json::Value {
    let label = match outcome {
        ProductDeletion::Deleted => "eliminado",
        ProductDeletion::Deactivated => "desactivado",
    };
    json!({ "resultado": label })
}

/// Public listing of active products.
#[utoipa::path(
    get,
    path = "/api/archivos",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products", body = ProductPage),
        (status = 400, description = "Invalid filter", body = Error)
    ),
    tags = ["products"],
    operation_id = "listProducts",
    security([])
)]
#[get("/api/archivos")]
pub async fn list_products(
    state: web::Data<HttpState>,
    query: web::Query<ProductListQuery>,
) -> ApiResult<web::Json<Page<Product>>> {
    let page = page_request(query.page, query.limit)?;
    let filter = query.to_filter()?;
    Ok(web::Json(state.products.list(filter, page).await?))
}

/// The caller's own products, including hidden ones.
#[utoipa::path(
    get,
    path = "/api/archivos/mis-archivos",
    params(PageQuery),
    responses(
        (status = 200, description = "Products", body = ProductPage),
        (status = 403, description = "Not a seller", body = Error)
    ),
    tags = ["products"],
    operation_id = "listMyProducts"
)]
#[get("/api/archivos/mis-archivos")]
pub async fn list_my_products(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Product>>> {
    let actor = user.require_seller()?;
    let page = query.to_request()?;
    Ok(web::Json(state.products.list_mine(actor, page).await?))
}

/// Product detail with its gallery. Hidden products are only visible to
/// their seller and administrators.
#[utoipa::path(
    get,
    path = "/api/archivos/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductDetail),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["products"],
    operation_id = "getProduct",
    security((), ("bearer" = []))
)]
#[get("/api/archivos/{id}")]
pub async fn get_product(
    state: web::Data<HttpState>,
    user: Option<AuthenticatedUser>,
    path: web::Path<ProductId>,
) -> ApiResult<web::Json<ProductDetail>> {
    let viewer = user.as_ref().map(AuthenticatedUser::actor);
    Ok(web::Json(state.products.get(viewer, path.into_inner()).await?))
}

/// Upload a product file with its metadata.
#[utoipa::path(
    post,
    path = "/api/archivos",
    request_body(content = ProductUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = Product),
        (status = 400, description = "Invalid form or file", body = Error),
        (status = 403, description = "Not a seller", body = Error)
    ),
    tags = ["products"],
    operation_id = "createProduct"
)]
#[post("/api/archivos")]
pub async fn create_product(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let actor = user.require_seller()?;
    let mut form = read_upload_form(payload, FILE_FIELD, state.upload_limit).await?;
    let draft = draft_from_form(&form)?;
    let upload = form.take_file(FILE_FIELD)?;
    let product = state.products.create(actor, draft, upload).await?;
    Ok(HttpResponse::Created().json(product))
}

/// Edit product metadata (owner or administrator).
#[utoipa::path(
    put,
    path = "/api/archivos/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated", body = Product),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["products"],
    operation_id = "updateProduct"
)]
#[put("/api/archivos/{id}")]
pub async fn update_product(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
    payload: web::Json<UpdateProductRequest>,
) -> ApiResult<web::Json<Product>> {
    let changes = ProductChanges::try_from(payload.into_inner())?;
    let product = state
        .products
        .update(user.actor(), path.into_inner(), changes)
        .await?;
    Ok(web::Json(product))
}

/// Delete a product; purchased products are only hidden.
#[utoipa::path(
    delete,
    path = "/api/archivos/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Outcome", body = ProductDeletionBody),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["products"],
    operation_id = "deleteProduct"
)]
#[delete("/api/archivos/{id}")]
pub async fn delete_product(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
) -> ApiResult<web::Json<serde_json::Value>> {
    let outcome = state.products.delete(user.actor(), path.into_inner()).await?;
    Ok(web::Json(deletion_body(outcome)))
}

/// Stream the product file as an attachment. Only full `200` responses are
/// counted; partial and conditional responses leave the counter alone.
#[utoipa::path(
    get,
    path = "/api/archivos/{id}/descargar",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 403, description = "Not purchased", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["products"],
    operation_id = "downloadProduct"
)]
#[get("/api/archivos/{id}/descargar")]
pub async fn download_product(
    req: HttpRequest,
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let download = state.products.download(user.actor(), id).await?;
    let file = NamedFile::open_async(&download.path).await.map_err(|err| {
        warn!(product = %id, error = %err, "stored product file is unreadable");
        Error::not_found(format!("file for product {id} is not available"))
    })?;
    let response = file
        .set_content_disposition(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(download.file_name)],
        })
        .into_response(&req);
    if response.status() == StatusCode::OK {
        state.products.record_download(id).await?;
    }
    Ok(response)
}

#[cfg(test)]
#[path = "products_tests.rs"]
mod tests;
