//! Type-safe unit price using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10,2)` and never go through floating point.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not of the form `12` or `12.54`.
    #[error("invalid price format, expected digits with at most two decimals (e.g. 12.54)")]
    InvalidFormat,
    /// The value does not fit the storage column.
    #[error("price is too large")]
    TooLarge,
}

/// A non-negative unit price with at most two decimal places.
///
/// # Examples
///
/// ```
/// use threadline_core::Price;
///
/// let price = Price::parse("19.99").unwrap();
/// assert_eq!(price.to_string(), "19.99");
///
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("1.999").is_err());
/// assert!(Price::parse("12,50").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Largest value a `NUMERIC(10,2)` column can hold.
    pub const MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Parse a price from its decimal string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, has a sign, more than two
    /// decimals, any non-digit character, or exceeds [`Price::MAX`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (s, None),
        };

        let digits_only = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits_only(whole) {
            return Err(PriceError::InvalidFormat);
        }
        if let Some(fraction) = fraction
            && (!digits_only(fraction) || fraction.len() > 2)
        {
            return Err(PriceError::InvalidFormat);
        }

        let value = Decimal::from_str(s).map_err(|_| PriceError::TooLarge)?;
        Self::from_decimal(value)
    }

    /// Wrap a decimal value read back from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative, has more than two decimals or
    /// exceeds [`Price::MAX`].
    pub fn from_decimal(value: Decimal) -> Result<Self, PriceError> {
        if value.is_sign_negative() || value.normalize().scale() > 2 {
            return Err(PriceError::InvalidFormat);
        }
        if value > Self::MAX {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(value))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
