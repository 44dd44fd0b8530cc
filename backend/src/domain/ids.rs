//! Integer identifier newtypes for persisted entities.
//!
//! Every table keys its rows with a `SERIAL` column. Wrapping those integers
//! keeps a product id from being passed where a user id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database identifier.
            #[must_use]
            pub const fn new(value: i32) -> Self {
                Self(value)
            }

            /// Raw database identifier.
            #[must_use]
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a `usuarios` row.
    UserId
);
define_id!(
    /// Identifier of a `vendedor` row.
    SellerId
);
define_id!(
    /// Identifier of a row in any lookup table (category, extension, ...).
    CatalogId
);
define_id!(
    /// Identifier of an `archivos` row.
    ProductId
);
define_id!(
    /// Identifier of an `imagenes_archivo` row.
    ImageId
);
define_id!(
    /// Identifier of a `transacciones` row.
    TransactionId
);
define_id!(
    /// Identifier of a `detalle_transaccion` row.
    DetailId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialise_as_bare_integers() {
        let value = serde_json::to_value(ProductId::new(7)).expect("serialise id");
        assert_eq!(value, serde_json::json!(7));
        let parsed: UserId = serde_json::from_value(serde_json::json!(12)).expect("parse id");
        assert_eq!(parsed.get(), 12);
    }
}
