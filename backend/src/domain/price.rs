//! Monetary amounts stored as integer cents.
//!
//! Prices travel as decimal strings with at most two fractional digits
//! (`"12.50"`). Clients that send a JSON number (the PayPal SDK reports
//! captured totals that way) are accepted too. Arithmetic never touches
//! floating point.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Validation failures for [`Price`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    /// The input is empty or not a decimal number.
    #[error("price must be a decimal number such as 12.50")]
    Malformed,
    /// Negative prices are not accepted.
    #[error("price must not be negative")]
    Negative,
    /// More than two fractional digits were supplied.
    #[error("price must have at most two decimal places")]
    TooPrecise,
    /// The amount does not fit in the storage column.
    #[error("price is too large")]
    Overflow,
}

/// Non-negative amount in cents.
///
/// # Examples
/// ```
/// use mercado::domain::Price;
///
/// let price: Price = "12.5".parse().expect("valid price");
/// assert_eq!(price.cents(), 1250);
/// assert_eq!(price.to_string(), "12.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Build a price from a cent amount.
    ///
    /// # Errors
    /// Returns [`PriceError::Negative`] for negative amounts.
    pub const fn from_cents(cents: i64) -> Result<Self, PriceError> {
        if cents < 0 {
            Err(PriceError::Negative)
        } else {
            Ok(Self(cents))
        }
    }

    /// Amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Add two prices, failing on overflow.
    ///
    /// # Errors
    /// Returns [`PriceError::Overflow`] when the sum does not fit.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(PriceError::Overflow)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0.div_euclid(100), self.0.rem_euclid(100))
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.starts_with('-') {
            return Err(PriceError::Negative);
        }
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PriceError::Malformed);
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PriceError::Malformed);
        }
        if fraction.len() > 2 {
            return Err(PriceError::TooPrecise);
        }
        let units: i64 = whole.parse().map_err(|_| PriceError::Overflow)?;
        let cents = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| PriceError::Malformed)? * 10,
            _ => fraction.parse::<i64>().map_err(|_| PriceError::Malformed)?,
        };
        units
            .checked_mul(100)
            .and_then(|value| value.checked_add(cents))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = match PriceRepr::deserialize(deserializer)? {
            PriceRepr::Text(text) => text,
            PriceRepr::Number(number) => number.to_string(),
        };
        raw.parse().map_err(serde::de::Error::custom)
    }
}
