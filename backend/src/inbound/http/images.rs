//! Product gallery handlers.
//!
//! ```text
//! GET /api/imagenes/archivo/3
//! POST /api/imagenes/archivo/3 (multipart: imagen, orden, es_portada)
//! PUT /api/imagenes/archivo/3/orden {"imagenes":[7,5,6]}
//! PUT /api/imagenes/5 {"orden":2}
//! PUT /api/imagenes/5/portada
//! DELETE /api/imagenes/5
//! ```

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::ImagePlacement;
use crate::domain::{Error, ImageChanges, ImageId, ProductId, ProductImage};

use super::ApiResult;
use super::auth::AuthenticatedUser;
use super::multipart::read_upload_form;
use super::schemas::ImageUploadForm;
use super::state::HttpState;
use super::validation::{FieldName, invalid_value_error, parse_flag, parse_i32};

const IMAGE_FIELD: FieldName = FieldName::new("imagen");

/// Request body for `PUT /api/imagenes/{id}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateImageRequest {
    pub orden: Option<i32>,
    /// `true` promotes the image to cover.
    pub es_portada: Option<bool>,
}

impl From<UpdateImageRequest> for ImageChanges {
    fn from(value: UpdateImageRequest) -> Self {
        Self {
            order: value.orden,
            is_cover: value.es_portada,
        }
    }
}

/// Request body for `PUT /api/imagenes/archivo/{id}/orden`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReorderImagesRequest {
    /// Every image id of the product, in the new order.
    #[schema(value_type = Vec<i32>, example = json!([7, 5, 6]))]
    pub imagenes: Vec<ImageId>,
}

/// Gallery of a product ordered by `orden`.
#[utoipa::path(
    get,
    path = "/api/imagenes/archivo/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Images", body = [ProductImage]),
        (status = 404, description = "Product not found", body = Error)
    ),
    tags = ["images"],
    operation_id = "listImages",
    security([])
)]
#[get("/api/imagenes/archivo/{id}")]
pub async fn list_images(
    state: web::Data<HttpState>,
    path: web::Path<ProductId>,
) -> ApiResult<web::Json<Vec<ProductImage>>> {
    Ok(web::Json(state.gallery.list(path.into_inner()).await?))
}

/// Add an image to a product's gallery.
#[utoipa::path(
    post,
    path = "/api/imagenes/archivo/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = ProductImage),
        (status = 400, description = "Invalid form or image type", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Product not found", body = Error)
    ),
    tags = ["images"],
    operation_id = "addImage"
)]
#[post("/api/imagenes/archivo/{id}")]
pub async fn add_image(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let mut form = read_upload_form(payload, IMAGE_FIELD, state.upload_limit).await?;
    let placement = ImagePlacement {
        order: form
            .text(FieldName::new("orden"))
            .map(|raw| parse_i32(raw, FieldName::new("orden")))
            .transpose()?,
        is_cover: form
            .text(FieldName::new("es_portada"))
            .map(|raw| parse_flag(raw, FieldName::new("es_portada")))
            .transpose()?
            .unwrap_or(false),
    };
    let upload = form.take_file(IMAGE_FIELD)?;
    let image = state
        .gallery
        .add(user.actor(), path.into_inner(), upload, placement)
        .await?;
    Ok(HttpResponse::Created().json(image))
}

/// Reorder a product's whole gallery in one step.
#[utoipa::path(
    put,
    path = "/api/imagenes/archivo/{id}/orden",
    params(("id" = i32, Path, description = "Product id")),
    request_body = ReorderImagesRequest,
    responses(
        (status = 200, description = "Reordered gallery", body = [ProductImage]),
        (status = 400, description = "Ids do not match the gallery", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["images"],
    operation_id = "reorderImages"
)]
#[put("/api/imagenes/archivo/{id}/orden")]
pub async fn reorder_images(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<ProductId>,
    payload: web::Json<ReorderImagesRequest>,
) -> ApiResult<web::Json<Vec<ProductImage>>> {
    let order = payload.into_inner().imagenes;
    if order.is_empty() {
        return Err(invalid_value_error(
            FieldName::new("imagenes"),
            "imagenes must list the gallery's image ids",
        ));
    }
    let images = state
        .gallery
        .reorder(user.actor(), path.into_inner(), order)
        .await?;
    Ok(web::Json(images))
}

/// Move an image or change its cover flag.
#[utoipa::path(
    put,
    path = "/api/imagenes/{id}",
    params(("id" = i32, Path, description = "Image id")),
    request_body = UpdateImageRequest,
    responses(
        (status = 200, description = "Updated", body = ProductImage),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["images"],
    operation_id = "updateImage"
)]
#[put("/api/imagenes/{id}")]
pub async fn update_image(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<ImageId>,
    payload: web::Json<UpdateImageRequest>,
) -> ApiResult<web::Json<ProductImage>> {
    let changes = ImageChanges::from(payload.into_inner());
    if changes.order.is_none() && changes.is_cover.is_none() {
        return Err(Error::invalid_request("no fields to update"));
    }
    let image = state
        .gallery
        .update(user.actor(), path.into_inner(), changes)
        .await?;
    Ok(web::Json(image))
}

/// Make an image the product's cover.
#[utoipa::path(
    put,
    path = "/api/imagenes/{id}/portada",
    params(("id" = i32, Path, description = "Image id")),
    responses(
        (status = 200, description = "New cover", body = ProductImage),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["images"],
    operation_id = "setCoverImage"
)]
#[put("/api/imagenes/{id}/portada")]
pub async fn set_cover(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<ImageId>,
) -> ApiResult<web::Json<ProductImage>> {
    Ok(web::Json(
        state.gallery.set_cover(user.actor(), path.into_inner()).await?,
    ))
}

/// Remove an image and its stored file.
#[utoipa::path(
    delete,
    path = "/api/imagenes/{id}",
    params(("id" = i32, Path, description = "Image id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["images"],
    operation_id = "deleteImage"
)]
#[delete("/api/imagenes/{id}")]
pub async fn delete_image(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<ImageId>,
) -> ApiResult<HttpResponse> {
    state.gallery.delete(user.actor(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
