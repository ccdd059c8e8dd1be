//! Type-safe price representation using decimal arithmetic.
//!
//! Prices arrive from forms as strings (`"24.99"`) and are parsed against a
//! fixed decimal pattern before they become a [`Price`]. The pattern only
//! admits non-negative values with at most two fractional digits.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Accepted price format: digits, optionally followed by one or two decimals.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d{1,2})?$").expect("Invalid regex"));

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input does not match `^\d+(\.\d{1,2})?$`.
    #[error("price must be a non-negative amount with at most two decimals")]
    InvalidFormat,
    /// The value does not fit in a decimal.
    #[error("price is out of range")]
    OutOfRange,
}

/// A non-negative price in the shop's currency.
///
/// ## Examples
///
/// ```
/// use poster_studio_core::Price;
///
/// assert!(Price::parse("24.99").is_ok());
/// assert!(Price::parse("0").is_ok());
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("1.999").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Parse a `Price` from a decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, does not match the price
    /// pattern, or overflows a decimal.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }

        if !PRICE_RE.is_match(s) {
            return Err(PriceError::InvalidFormat);
        }

        Decimal::from_str(s)
            .map(Self)
            .map_err(|_| PriceError::OutOfRange)
    }

    /// Create a price from an already-validated decimal (e.g. a database value).
    #[must_use]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prices() {
        assert_eq!(Price::parse("24.99").unwrap().amount(), Decimal::new(2499, 2));
        assert_eq!(Price::parse("0").unwrap().amount(), Decimal::ZERO);
        assert_eq!(Price::parse("10.5").unwrap().amount(), Decimal::new(105, 1));
        assert!(Price::parse(" 7 ").is_ok());
    }

    #[test]
    fn test_parse_invalid_prices() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("-1"), Err(PriceError::InvalidFormat));
        assert_eq!(Price::parse("1.999"), Err(PriceError::InvalidFormat));
        assert_eq!(Price::parse("1."), Err(PriceError::InvalidFormat));
        assert_eq!(Price::parse("abc"), Err(PriceError::InvalidFormat));
        assert_eq!(Price::parse("1e5"), Err(PriceError::InvalidFormat));
    }

    #[test]
    fn test_parse_overflow() {
        assert_eq!(Price::parse(&"9".repeat(40)), Err(PriceError::OutOfRange));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::parse("5").unwrap().to_string(), "5.00");
        assert_eq!(Price::parse("5.5").unwrap().to_string(), "5.50");
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&Price::parse("19.99").unwrap()).unwrap();
        assert_eq!(json, "\"19.99\"");
    }
}
