//! Registration, login, and current-user handlers.
//!
//! ```text
//! POST /api/auth/register {"nombre":"Ana","email":"ana@example.com","contrasena":"secreto1"}
//! POST /api/auth/login {"email":"ana@example.com","contrasena":"secreto1"}
//! GET /api/auth/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::AuthSession;
use crate::domain::{
    CatalogId, EmailAddress, Error, LoginCredentials, PlainPassword, Registration, User,
    UserName, UserRole,
};

use super::ApiResult;
use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::validation::{
    FieldName, map_user_validation_error, parse_date, parse_role,
};

/// Request body for `POST /api/auth/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    /// Display name.
    #[schema(example = "Ana Pérez")]
    pub nombre: String,
    /// Login email.
    #[schema(example = "ana@example.com")]
    pub email: String,
    /// Password, 6 to 72 bytes.
    pub contrasena: String,
    /// Optional birth date, `YYYY-MM-DD`.
    #[schema(example = "1994-05-17")]
    pub fecha_nacimiento: Option<String>,
    /// Optional gender row.
    pub id_genero: Option<i32>,
    /// `1` (Cliente, default) or `2` (Vendedor).
    pub id_tipo_usuario: Option<i32>,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        let role = match value.id_tipo_usuario {
            Some(id) => parse_role(id, FieldName::new("id_tipo_usuario"))?,
            None => UserRole::Client,
        };
        Ok(Self {
            name: UserName::parse(&value.nombre).map_err(map_user_validation_error)?,
            email: EmailAddress::parse(&value.email).map_err(map_user_validation_error)?,
            password: PlainPassword::parse(value.contrasena).map_err(map_user_validation_error)?,
            birth_date: value
                .fecha_nacimiento
                .as_deref()
                .map(|raw| parse_date(raw, FieldName::new("fecha_nacimiento")))
                .transpose()?,
            gender_id: value.id_genero.map(CatalogId::new),
            role,
        })
    }
}

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Password.
    pub contrasena: String,
}

impl From<LoginRequest> for LoginCredentials {
    fn from(value: LoginRequest) -> Self {
        Self {
            email: value.email,
            password: PlainPassword::for_verification(value.contrasena),
        }
    }
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthSession),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/api/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let session = state.accounts.register(registration).await?;
    Ok(HttpResponse::Created().json(session))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthSession),
        (status = 401, description = "Invalid credentials", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/api/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthSession>> {
    let session = state.accounts.login(payload.into_inner().into()).await?;
    Ok(web::Json(session))
}

/// The user the bearer token belongs to.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid token", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/api/auth/me")]
pub async fn current_user(user: AuthenticatedUser) -> web::Json<User> {
    web::Json(user.into_user())
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
