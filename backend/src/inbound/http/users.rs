//! User administration and profile handlers.
//!
//! ```text
//! GET /api/usuarios?busqueda=ana&id_tipo_usuario=2&page=1&limit=20
//! GET /api/usuarios/7
//! PUT /api/usuarios/7 {"nombre":"Ana","fecha_nacimiento":null}
//! PUT /api/usuarios/7/contrasena {"contrasena_actual":"...","contrasena_nueva":"..."}
//! DELETE /api/usuarios/7
//! ```

use actix_web::{HttpResponse, delete, get, put, web};
use pagination::Page;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::PasswordChange;
use crate::domain::{
    CatalogId, EmailAddress, Error, PlainPassword, User, UserChanges, UserFilter, UserId,
    UserName,
};

use super::ApiResult;
use super::auth::AuthenticatedUser;
use super::schemas::UserPage;
use super::state::HttpState;
use super::validation::{
    FieldName, double_option, invalid_value_error, map_user_validation_error, page_request, parse_date, parse_role,
};

/// Query parameters for `GET /api/usuarios`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Case-insensitive match on name or email.
    pub busqueda: Option<String>,
    /// Restrict to one role id.
    pub id_tipo_usuario: Option<i32>,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size (max 100).
    pub limit: Option<u32>,
}

impl UserListQuery {
    fn to_filter(&self) -> Result<UserFilter, Error> {
        Ok(UserFilter {
            search: self
                .busqueda
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_owned),
            role: self
                .id_tipo_usuario
                .map(|id| parse_role(id, FieldName::new("id_tipo_usuario")))
                .transpose()?,
        })
    }
}

/// Request body for `PUT /api/usuarios/{id}`. Absent keys are left
/// unchanged; `null` clears the optional columns.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateUserRequest {
    pub nombre: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, example = "1994-05-17")]
    pub fecha_nacimiento: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub id_genero: Option<Option<i32>>,
    /// Administrators only.
    pub id_tipo_usuario: Option<i32>,
}

impl TryFrom<UpdateUserRequest> for UserChanges {
    type Error = Error;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        let birth_date = match value.fecha_nacimiento {
            Some(Some(raw)) => Some(Some(parse_date(&raw, FieldName::new("fecha_nacimiento"))?)),
            Some(None) => Some(None),
            None => None,
        };
        Ok(Self {
            name: value
                .nombre
                .as_deref()
                .map(UserName::parse)
                .transpose()
                .map_err(map_user_validation_error)?,
            email: value
                .email
                .as_deref()
                .map(EmailAddress::parse)
                .transpose()
                .map_err(map_user_validation_error)?,
            birth_date,
            gender_id: value.id_genero.map(|id| id.map(CatalogId::new)),
            role: value
                .id_tipo_usuario
                .map(|id| parse_role(id, FieldName::new("id_tipo_usuario")))
                .transpose()?,
        })
    }
}

/// Request body for `PUT /api/usuarios/{id}/contrasena`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub contrasena_actual: String,
    pub contrasena_nueva: String,
}

impl TryFrom<ChangePasswordRequest> for PasswordChange {
    type Error = Error;

    fn try_from(value: ChangePasswordRequest) -> Result<Self, Self::Error> {
        let new = PlainPassword::parse(value.contrasena_nueva)
            .map_err(|err| invalid_value_error(FieldName::new("contrasena_nueva"), err.to_string()))?;
        Ok(Self {
            current: PlainPassword::for_verification(value.contrasena_actual),
            new,
        })
    }
}

/// List users (administrators).
#[utoipa::path(
    get,
    path = "/api/usuarios",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = UserPage),
        (status = 400, description = "Invalid filter", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/api/usuarios")]
pub async fn list_users(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<UserListQuery>,
) -> ApiResult<web::Json<Page<User>>> {
    let actor = user.require_admin()?;
    let page = page_request(query.page, query.limit)?;
    let filter = query.to_filter()?;
    Ok(web::Json(state.users.list(actor, filter, page).await?))
}

/// Fetch one user (self or administrator).
#[utoipa::path(
    get,
    path = "/api/usuarios/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/api/usuarios/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<UserId>,
) -> ApiResult<web::Json<User>> {
    let id = path.into_inner();
    let actor = user.require_self_or_admin(id)?;
    Ok(web::Json(state.users.get(actor, id).await?))
}

/// Update a profile (self or administrator).
#[utoipa::path(
    put,
    path = "/api/usuarios/{id}",
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/api/usuarios/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<UserId>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<User>> {
    let id = path.into_inner();
    let actor = user.require_self_or_admin(id)?;
    let changes = UserChanges::try_from(payload.into_inner())?;
    Ok(web::Json(state.users.update(actor, id, changes).await?))
}

/// Change the caller's own password.
#[utoipa::path(
    put,
    path = "/api/usuarios/{id}/contrasena",
    params(("id" = i32, Path, description = "User id")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Current password incorrect or new one invalid", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["users"],
    operation_id = "changePassword"
)]
#[put("/api/usuarios/{id}/contrasena")]
pub async fn change_password(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<UserId>,
    payload: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    let change = PasswordChange::try_from(payload.into_inner())?;
    state
        .users
        .change_password(user.actor(), path.into_inner(), change)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete a user (administrators).
#[utoipa::path(
    delete,
    path = "/api/usuarios/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Cannot delete yourself", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Referenced by products or purchases", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/api/usuarios/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<UserId>,
) -> ApiResult<HttpResponse> {
    let actor = user.require_admin()?;
    state.users.delete(actor, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests;
