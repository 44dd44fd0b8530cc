//! Lookup tables administered through the catalog endpoints.
//!
//! Six small id/name tables share one set of operations. [`CatalogKind`]
//! names the table and carries the per-table facts the service needs: its
//! route label, the JSON key for its id, and which rows are system rows that
//! application code refers to by id.

use std::fmt;

use serde::Serialize;
use serde::ser::SerializeMap;

use super::CatalogId;

/// Longest accepted catalog name.
pub const CATALOG_NAME_MAX: usize = 100;

/// Lookup tables exposed through the catalog endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    /// `categoria_archivo`: product categories.
    Category,
    /// `extension_archivo`: product file extensions.
    Extension,
    /// `genero_usuario`: user genders.
    Gender,
    /// `metodos_pago`: payment methods.
    PaymentMethod,
    /// `tipo_usuarios`: user roles.
    UserType,
    /// `estado_transaccion`: purchase statuses.
    TransactionStatus,
}

impl CatalogKind {
    /// Every catalog, in route registration order.
    pub const ALL: [Self; 6] = [
        Self::Category,
        Self::Extension,
        Self::Gender,
        Self::PaymentMethod,
        Self::UserType,
        Self::TransactionStatus,
    ];

    /// Path segment under `/api`.
    #[must_use]
    pub const fn route(self) -> &'static str {
        match self {
            Self::Category => "categorias",
            Self::Extension => "extensiones",
            Self::Gender => "generos",
            Self::PaymentMethod => "metodos-pago",
            Self::UserType => "tipo-usuarios",
            Self::TransactionStatus => "estados-transaccion",
        }
    }

    /// JSON key carrying the row id.
    #[must_use]
    pub const fn id_field(self) -> &'static str {
        match self {
            Self::Category => "id_categoria",
            Self::Extension => "id_extension",
            Self::Gender => "id_genero",
            Self::PaymentMethod => "id_metodo_pago",
            Self::UserType => "id_tipo_usuario",
            Self::TransactionStatus => "id_estado",
        }
    }

    /// Singular noun used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Extension => "extension",
            Self::Gender => "gender",
            Self::PaymentMethod => "payment method",
            Self::UserType => "user type",
            Self::TransactionStatus => "transaction status",
        }
    }

    /// Whether the row is a system row that must never be deleted.
    ///
    /// User types 1-4 back [`super::UserRole`], statuses 1-4 back the
    /// purchase flow, and the seeded PayPal row records captures.
    #[must_use]
    pub fn is_protected(self, id: CatalogId) -> bool {
        match self {
            Self::UserType | Self::TransactionStatus => (1..=4).contains(&id.get()),
            Self::PaymentMethod => id == super::PAYPAL_METHOD_ID,
            Self::Category | Self::Extension | Self::Gender => false,
        }
    }

    /// Whether the row is looked up by name and so must keep it.
    #[must_use]
    pub fn is_name_locked(self, id: CatalogId) -> bool {
        self == Self::PaymentMethod && self.is_protected(id)
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validation failures for [`CatalogName`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogNameError {
    /// The name is empty once trimmed.
    #[error("nombre must not be empty")]
    Empty,
    /// The name exceeds [`CATALOG_NAME_MAX`] characters.
    #[error("nombre must be at most {max} characters")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
}

/// Trimmed, length-checked catalog row name.
///
/// Extension names are stored lower case without a leading dot so `".PDF"`
/// and `"pdf"` collide on the unique index.
///
/// # Examples
/// ```
/// use mercado::domain::{CatalogKind, CatalogName};
///
/// let name = CatalogName::parse(CatalogKind::Extension, " .PDF ").expect("valid");
/// assert_eq!(name.as_str(), "pdf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogName(String);

impl CatalogName {
    /// Normalise and validate a raw name for the given catalog.
    ///
    /// # Errors
    /// Returns [`CatalogNameError`] when the name is empty or too long.
    pub fn parse(kind: CatalogKind, raw: &str) -> Result<Self, CatalogNameError> {
        let trimmed = raw.trim();
        let normalised = match kind {
            CatalogKind::Extension => trimmed.trim_start_matches('.').to_lowercase(),
            _ => trimmed.to_owned(),
        };
        if normalised.is_empty() {
            return Err(CatalogNameError::Empty);
        }
        if normalised.chars().count() > CATALOG_NAME_MAX {
            return Err(CatalogNameError::TooLong {
                max: CATALOG_NAME_MAX,
            });
        }
        Ok(Self(normalised))
    }

    /// Normalised name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A row of a lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Row id.
    pub id: CatalogId,
    /// Display name.
    pub name: String,
}

impl CatalogEntry {
    /// Build an entry from its parts.
    pub fn new(id: CatalogId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Pair the entry with its kind so it serialises with the table's id key.
    #[must_use]
    pub const fn in_catalog(&self, kind: CatalogKind) -> CatalogRecord<'_> {
        CatalogRecord { kind, entry: self }
    }
}

/// Serialisation view of a [`CatalogEntry`] keyed by its table.
///
/// A category serialises as `{"id_categoria": 1, "nombre": "Plantillas"}`.
#[derive(Debug, Clone, Copy)]
pub struct CatalogRecord<'a> {
    kind: CatalogKind,
    entry: &'a CatalogEntry,
}

impl Serialize for CatalogRecord<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.kind.id_field(), &self.entry.id)?;
        map.serialize_entry("nombre", &self.entry.name)?;
        map.end()
    }
}
