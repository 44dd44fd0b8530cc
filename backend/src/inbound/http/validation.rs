//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper produces an [`Error::invalid_request`] whose `details` name
//! the offending field and a stable `code`.

use chrono::NaiveDate;
use pagination::{PageRequest, PageRequestError};
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::domain::{
    Error, Price, PriceError, ProductValidationError, UserRole, UserValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidValue,
    InvalidDate,
    InvalidPrice,
    InvalidPage,
    FileTooLarge,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidValue => "invalid_value",
            Self::InvalidDate => "invalid_date",
            Self::InvalidPrice => "invalid_price",
            Self::InvalidPage => "invalid_page",
            Self::FileTooLarge => "file_too_large",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field: field.as_str(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    ValidationError::new(field, format!("missing required field: {}", field.as_str()))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_value_error(field: FieldName, message: impl Into<String>) -> Error {
    ValidationError::new(field, message).with_code(ErrorCode::InvalidValue)
}

pub(crate) fn file_too_large_error(field: FieldName, limit: usize) -> Error {
    Error::invalid_request(format!("{} exceeds the {limit} byte limit", field.as_str()))
        .with_details(json!({
            "field": field.as_str(),
            "limit": limit,
            "code": ErrorCode::FileTooLarge.as_str(),
        }))
}

pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

/// Parse a decimal price such as `12.50`.
pub(crate) fn parse_price(value: &str, field: FieldName) -> Result<Price, Error> {
    value.parse::<Price>().map_err(|err: PriceError| {
        ValidationError::new(field, format!("{}: {err}", field.as_str()))
            .with_value(ErrorCode::InvalidPrice, value)
    })
}

pub(crate) fn parse_optional_price(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Price>, Error> {
    value.map(|raw| parse_price(raw, field)).transpose()
}

/// Parse an integer form field.
pub(crate) fn parse_i32(value: &str, field: FieldName) -> Result<i32, Error> {
    value.trim().parse::<i32>().map_err(|_| {
        ValidationError::new(field, format!("{} must be an integer", field.as_str()))
            .with_value(ErrorCode::InvalidValue, value)
    })
}

/// Parse a `true`/`false` form field; `1`/`0` are accepted too.
pub(crate) fn parse_flag(value: &str, field: FieldName) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(
            ValidationError::new(field, format!("{} must be true or false", field.as_str()))
                .with_value(ErrorCode::InvalidValue, value),
        ),
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::new(field, format!("{} must be a YYYY-MM-DD date", field.as_str()))
            .with_value(ErrorCode::InvalidDate, value)
    })
}

/// Map a role id to a [`UserRole`].
pub(crate) fn parse_role(id: i32, field: FieldName) -> Result<UserRole, Error> {
    UserRole::try_from(id).map_err(|err| {
        ValidationError::new(field, err.to_string())
            .with_value(ErrorCode::InvalidValue, id.to_string())
    })
}

pub(crate) fn map_user_validation_error(err: UserValidationError) -> Error {
    let field = match err {
        UserValidationError::EmptyName | UserValidationError::NameTooLong { .. } => "nombre",
        UserValidationError::InvalidEmail => "email",
        UserValidationError::PasswordTooShort { .. }
        | UserValidationError::PasswordTooLong { .. } => "contrasena",
        UserValidationError::UnknownRole { .. } => "id_tipo_usuario",
    };
    ValidationError::new(FieldName::new(field), err.to_string()).with_code(ErrorCode::InvalidValue)
}

pub(crate) fn map_product_validation_error(err: ProductValidationError) -> Error {
    let field = match err {
        ProductValidationError::EmptyName | ProductValidationError::NameTooLong { .. } => "nombre",
        ProductValidationError::DescriptionTooLong { .. } => "descripcion",
        ProductValidationError::UnknownSort { .. } => "orden",
        ProductValidationError::InvertedPriceRange => "precio_min",
    };
    ValidationError::new(FieldName::new(field), err.to_string()).with_code(ErrorCode::InvalidValue)
}

/// Distinguish an absent JSON key (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `page`/`limit` query parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// One-based page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 20, max 100).
    pub limit: Option<u32>,
}

impl PageQuery {
    pub(crate) fn to_request(&self) -> Result<PageRequest, Error> {
        page_request(self.page, self.limit)
    }
}

pub(crate) fn page_request(page: Option<u32>, limit: Option<u32>) -> Result<PageRequest, Error> {
    PageRequest::from_query(page, limit).map_err(|err: PageRequestError| {
        let field = match err {
            PageRequestError::ZeroPage => "page",
            PageRequestError::LimitOutOfRange { .. } => "limit",
        };
        ValidationError::new(FieldName::new(field), err.to_string()).with_code(ErrorCode::InvalidPage)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    fn detail_code(error: &Error) -> Option<&str> {
        error.details()?.get("code")?.as_str()
    }

    #[rstest]
    fn missing_field_names_the_field() {
        let error = missing_field_error(FieldName::new("archivo"));
        assert_eq!(error.code(), DomainCode::InvalidRequest);
        assert_eq!(error.message(), "missing required field: archivo");
        assert_eq!(detail_code(&error), Some("missing_field"));
    }

    #[rstest]
    #[case("12.5", Some(1250))]
    #[case("-1", None)]
    #[case("abc", None)]
    fn prices_are_parsed(#[case] raw: &str, #[case] cents: Option<i64>) {
        let parsed = parse_price(raw, FieldName::new("precio"));
        match cents {
            Some(expected) => assert_eq!(parsed.map(Price::cents).ok(), Some(expected)),
            None => {
                let error = parsed.expect_err("invalid price");
                assert_eq!(detail_code(&error), Some("invalid_price"));
            }
        }
    }

    #[rstest]
    #[case("true", true)]
    #[case("1", true)]
    #[case("FALSE", false)]
    #[case("0", false)]
    fn flags_are_parsed(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_flag(raw, FieldName::new("es_portada")).ok(), Some(expected));
    }

    #[rstest]
    fn bad_flag_is_rejected() {
        assert!(parse_flag("maybe", FieldName::new("es_portada")).is_err());
    }

    #[rstest]
    fn dates_use_iso_format() {
        assert!(parse_date("1990-02-28", FieldName::new("fecha_nacimiento")).is_ok());
        let error = parse_date("28/02/1990", FieldName::new("fecha_nacimiento"))
            .expect_err("wrong format");
        assert_eq!(detail_code(&error), Some("invalid_date"));
    }

    #[rstest]
    #[case(UserValidationError::InvalidEmail, "email")]
    #[case(UserValidationError::PasswordTooShort { min: 6 }, "contrasena")]
    #[case(UserValidationError::EmptyName, "nombre")]
    fn user_validation_errors_name_their_field(
        #[case] err: UserValidationError,
        #[case] field: &str,
    ) {
        let error = map_user_validation_error(err);
        let details = error.details().expect("details");
        assert_eq!(details.get("field").and_then(|v| v.as_str()), Some(field));
    }

    #[rstest]
    #[case(Some(0), None, "page")]
    #[case(None, Some(500), "limit")]
    fn page_errors_name_their_field(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] field: &str,
    ) {
        let error = page_request(page, limit).expect_err("invalid page");
        let details = error.details().expect("details");
        assert_eq!(details.get("field").and_then(|v| v.as_str()), Some(field));
    }
}
