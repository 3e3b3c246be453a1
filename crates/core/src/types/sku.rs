//! Stock-keeping unit codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Sku`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SkuError {
    /// The input string is empty.
    #[error("SKU cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("SKU must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A SKU of the form `{BRAND}-{PRODUCT}-{SIZE}-{NNNN}`.
///
/// ## Examples
///
/// ```
/// use threadline_core::Sku;
///
/// let sku = Sku::candidate("Red Shirt", "Acme", &["M".to_string()], 4821);
/// assert_eq!(sku.as_str(), "ACM-RED-M-4821");
///
/// let sku = Sku::candidate("Jeans", "Blue Fox", &[" s ".to_string(), "xl".to_string()], 1000);
/// assert_eq!(sku.as_str(), "BLU-JEA-S-XL-1000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Maximum length accepted from storage or user input.
    pub const MAX_LENGTH: usize = 64;

    /// Lower bound of the random suffix.
    pub const SUFFIX_MIN: u16 = 1000;

    /// Upper bound (inclusive) of the random suffix.
    pub const SUFFIX_MAX: u16 = 9999;

    /// Format a SKU candidate.
    ///
    /// The brand and product codes are the first three characters of the
    /// whitespace-stripped, uppercased value. The size code is the trimmed
    /// size tokens joined with `-` and uppercased.
    #[must_use]
    pub fn candidate(name: &str, brand: &str, sizes: &[String], suffix: u16) -> Self {
        let size_code = sizes
            .iter()
            .map(|s| s.trim())
            .collect::<Vec<_>>()
            .join("-")
            .to_uppercase();

        Self(format!(
            "{}-{}-{}-{suffix}",
            code_of(brand),
            code_of(name),
            size_code
        ))
    }

    /// Parse a SKU read back from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or longer than [`Sku::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, SkuError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SkuError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SkuError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Get the SKU as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// First three characters of `value` with all whitespace removed, uppercased.
fn code_of(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
