//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices come from hand-maintained CSV files and older persisted
//! carts, so they arrive as JSON numbers, plain strings (`"12.50"`), or
//! strings carrying a currency symbol and an Italian decimal comma
//! (`"€ 12,50"`). [`Price::coerce`] normalizes all of these once, at the
//! boundary; everything past it works with an exact [`Decimal`].

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Errors that can occur when reading a price.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The text could not be read as a number once normalized.
    #[error("price {0:?} is not a number")]
    NotANumber(String),
    /// Prices are never negative.
    #[error("price {0} is negative")]
    Negative(Decimal),
    /// Above [`Price::MAX`].
    #[error("price {0} exceeds the maximum of {max}", max = Price::MAX)]
    TooLarge(Decimal),
    /// The JSON value has a type that cannot hold a price.
    #[error("price must be a number or a string, got {0}")]
    WrongType(&'static str),
}

/// A unit price in euros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted unit price (one billion euros).
    pub const MAX: Self = Self(Decimal::from_parts(1_000_000_000, 0, 0, false, 0));

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero and
    /// [`PriceError::TooLarge`] above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, saturating at the largest decimal.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }

    /// Parse free-form price text.
    ///
    /// Every character other than digits, `.`, `,` and `-` is discarded, then
    /// the first `,` becomes the decimal point. Text with no digits left is
    /// zero. `"1.234,56"` is rejected rather than guessed at.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized text is not a number, or is negative.
    ///
    /// # Example
    ///
    /// ```
    /// use sanital_core::Price;
    ///
    /// assert_eq!(Price::parse_lenient("€ 12,50").unwrap(), Price::from_cents(1250));
    /// assert_eq!(Price::parse_lenient("").unwrap(), Price::ZERO);
    /// assert!(Price::parse_lenient("1.2.3").is_err());
    /// ```
    pub fn parse_lenient(text: &str) -> Result<Self, PriceError> {
        let kept: String = text
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
            .collect();
        let normalized = kept.replacen(',', ".", 1);

        if normalized.is_empty() {
            return Ok(Self::ZERO);
        }

        let amount = Decimal::from_str(&normalized)
            .map_err(|_| PriceError::NotANumber(text.to_owned()))?;
        Self::new(amount)
    }

    /// Read a price from a loosely-typed JSON value.
    ///
    /// `null` counts as zero; numbers are taken at their printed precision;
    /// strings go through [`Price::parse_lenient`].
    ///
    /// # Errors
    ///
    /// Returns an error for booleans, arrays, objects, unparseable strings, and
    /// negative amounts.
    pub fn coerce(value: &Value) -> Result<Self, PriceError> {
        match value {
            Value::Null => Ok(Self::ZERO),
            Value::Number(n) => {
                let text = n.to_string();
                let amount = Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
                    .ok_or(PriceError::NotANumber(text))?;
                Self::new(amount)
            }
            Value::String(s) => Self::parse_lenient(s),
            Value::Bool(_) => Err(PriceError::WrongType("boolean")),
            Value::Array(_) => Err(PriceError::WrongType("array")),
            Value::Object(_) => Err(PriceError::WrongType("object")),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "€{:.2}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::coerce(&value).map_err(serde::de::Error::custom)
    }
}
