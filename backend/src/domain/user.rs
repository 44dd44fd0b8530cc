//! User identity, roles, and the validated inputs of the account flows.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroize;

use super::{CatalogId, UserId};

/// Maximum allowed length for a user name.
pub const USER_NAME_MAX: usize = 100;
/// Minimum allowed length for a password.
pub const PASSWORD_MIN: usize = 6;
/// Maximum allowed length for a password; bcrypt ignores bytes past 72.
pub const PASSWORD_MAX: usize = 72;

/// Validation errors raised while building user inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The name is blank.
    #[error("nombre must not be empty")]
    EmptyName,
    /// The name exceeds [`USER_NAME_MAX`] characters.
    #[error("nombre must be at most {max} characters")]
    NameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The email does not look like `local@domain.tld`.
    #[error("email must be a valid email address")]
    InvalidEmail,
    /// The password is shorter than [`PASSWORD_MIN`].
    #[error("contrasena must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },
    /// The password is longer than [`PASSWORD_MAX`] bytes.
    #[error("contrasena must be at most {max} bytes")]
    PasswordTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The role id is not one of the four system user types.
    #[error("unknown user type: {id}")]
    UnknownRole {
        /// Rejected role id.
        id: i32,
    },
}

/// User role, backed by the seeded `tipo_usuarios` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum UserRole {
    /// Buyer (`id_tipo_usuario = 1`).
    Client,
    /// Seller (`id_tipo_usuario = 2`).
    Seller,
    /// Super administrator (`id_tipo_usuario = 3`).
    SuperAdmin,
    /// Administrator (`id_tipo_usuario = 4`).
    Admin,
}

impl UserRole {
    /// Database id of the role row.
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Client => 1,
            Self::Seller => 2,
            Self::SuperAdmin => 3,
            Self::Admin => 4,
        }
    }

    /// Name stored in `tipo_usuarios.nombre`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Client => "Cliente",
            Self::Seller => "Vendedor",
            Self::SuperAdmin => "SuperAdmin",
            Self::Admin => "Admin",
        }
    }

    /// Whether the role may administer catalogs, users, and transactions.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    /// Whether the role may upload and manage products.
    #[must_use]
    pub const fn can_sell(self) -> bool {
        !matches!(self, Self::Client)
    }

    /// Whether self-service registration may pick this role.
    #[must_use]
    pub const fn is_self_assignable(self) -> bool {
        matches!(self, Self::Client | Self::Seller)
    }
}

impl From<UserRole> for i32 {
    fn from(role: UserRole) -> Self {
        role.id()
    }
}

impl TryFrom<i32> for UserRole {
    type Error = UserValidationError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Self::Client),
            2 => Ok(Self::Seller),
            3 => Ok(Self::SuperAdmin),
            4 => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownRole { id }),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Lower-cased, shape-checked email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// # Errors
    /// Returns [`UserValidationError::InvalidEmail`] for malformed input.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        let normalised = raw.trim().to_lowercase();
        if normalised.len() > 255 || !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }

    /// Normalised address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trimmed, non-empty user name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    /// Validate a user name.
    ///
    /// # Errors
    /// Returns [`UserValidationError`] when blank or too long.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if trimmed.chars().count() > USER_NAME_MAX {
            return Err(UserValidationError::NameTooLong { max: USER_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plain-text password held only until it is hashed or verified.
///
/// The buffer is wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(String);

impl PlainPassword {
    /// Validate password length.
    ///
    /// # Errors
    /// Returns [`UserValidationError`] when too short or too long.
    pub fn parse(raw: String) -> Result<Self, UserValidationError> {
        let password = Self(raw);
        if password.0.chars().count() < PASSWORD_MIN {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if password.0.len() > PASSWORD_MAX {
            return Err(UserValidationError::PasswordTooLong { max: PASSWORD_MAX });
        }
        Ok(password)
    }

    /// Wrap a password supplied for verification without length checks.
    #[must_use]
    pub fn for_verification(raw: String) -> Self {
        Self(raw)
    }

    /// Expose the secret to a hashing adapter.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(***)")
    }
}

impl Drop for PlainPassword {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Registered user as exposed through the API.
///
/// The password hash is deliberately absent; see [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct User {
    /// User id.
    #[serde(rename = "id_usuario")]
    #[schema(value_type = i32)]
    pub id: UserId,
    /// Display name.
    #[serde(rename = "nombre")]
    pub name: String,
    /// Normalised email address.
    pub email: String,
    /// Optional birth date.
    #[serde(rename = "fecha_nacimiento")]
    pub birth_date: Option<NaiveDate>,
    /// Registration timestamp.
    #[serde(rename = "fecha_registro")]
    pub registered_at: DateTime<Utc>,
    /// Role; serialised as its `tipo_usuarios` id.
    #[serde(rename = "id_tipo_usuario")]
    #[schema(value_type = i32)]
    pub role: UserRole,
    /// Optional gender row.
    #[serde(rename = "id_genero")]
    #[schema(value_type = Option<i32>)]
    pub gender_id: Option<CatalogId>,
}

impl User {
    /// Identity and role used for authorisation checks.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role,
        }
    }
}

/// Authenticated caller of a use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Caller's user id.
    pub id: UserId,
    /// Caller's role at authentication time.
    pub role: UserRole,
}

impl Actor {
    /// Whether the caller has administrative rights.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        self.role.is_admin()
    }

    /// Whether the caller is `user` or an administrator.
    #[must_use]
    pub fn is_self_or_admin(self, user: UserId) -> bool {
        self.id == user || self.is_admin()
    }
}

/// User row together with its stored password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    /// The user.
    pub user: User,
    /// bcrypt hash of the password.
    pub password_hash: String,
}

/// Validated self-service registration.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Display name.
    pub name: UserName,
    /// Login email.
    pub email: EmailAddress,
    /// Chosen password.
    pub password: PlainPassword,
    /// Optional birth date.
    pub birth_date: Option<NaiveDate>,
    /// Optional gender row.
    pub gender_id: Option<CatalogId>,
    /// Requested role; only [`UserRole::Client`] and [`UserRole::Seller`]
    /// are accepted.
    pub role: UserRole,
}

/// Row values for inserting a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Normalised email.
    pub email: String,
    /// bcrypt hash.
    pub password_hash: String,
    /// Optional birth date.
    pub birth_date: Option<NaiveDate>,
    /// Optional gender row.
    pub gender_id: Option<CatalogId>,
    /// Role; decides which extension row is created.
    pub role: UserRole,
}

/// Login attempt.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    /// Email address as typed.
    pub email: String,
    /// Password as typed.
    pub password: PlainPassword,
}

/// Partial profile update. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// New display name.
    pub name: Option<UserName>,
    /// New email.
    pub email: Option<EmailAddress>,
    /// New birth date; `Some(None)` clears it.
    pub birth_date: Option<Option<NaiveDate>>,
    /// New gender; `Some(None)` clears it.
    pub gender_id: Option<Option<CatalogId>>,
    /// New role (administrators only).
    pub role: Option<UserRole>,
}

impl UserChanges {
    /// Whether the update touches no column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.birth_date.is_none()
            && self.gender_id.is_none()
            && self.role.is_none()
    }
}

/// Filters for the administrative user listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    /// Restrict to one role.
    pub role: Option<UserRole>,
}
