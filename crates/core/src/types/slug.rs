//! URL-safe catalog slugs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing alphanumeric was left after transliteration.
    #[error("slug cannot be empty")]
    Empty,
    /// The input contains characters other than `a-z`, `0-9` and single `-`.
    #[error("slug may only contain lowercase letters, digits and single hyphens")]
    InvalidCharacters,
}

/// A lowercase, hyphen-separated identifier derived from a product name.
///
/// ## Constraints
///
/// - Only ASCII `a-z`, `0-9` and `-`
/// - No leading, trailing or repeated `-`
///
/// ## Examples
///
/// ```
/// use threadline_core::Slug;
///
/// let slug = Slug::from_name("Red Cotton Shirt").unwrap();
/// assert_eq!(slug.as_str(), "red-cotton-shirt");
/// assert_eq!(slug.with_suffix(1).as_str(), "red-cotton-shirt-1");
///
/// assert!(Slug::parse("Red Shirt").is_err());
/// assert!(Slug::from_name("!!!").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Lowercase-hyphenate a display name.
    ///
    /// The name is transliterated to ASCII first (`Café` becomes `cafe`), then
    /// every run of characters that is not ASCII alphanumeric collapses into a
    /// single `-`.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if nothing alphanumeric is left.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let ascii = deunicode::deunicode(name);
        let mut slug = String::with_capacity(ascii.len());
        let mut pending_hyphen = false;

        for c in ascii.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }

        if slug.is_empty() {
            return Err(SlugError::Empty);
        }
        Ok(Self(slug))
    }

    /// Validate an already-formed slug (e.g. from a URL path).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty or not in slug form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        let well_formed = s
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        if !well_formed {
            return Err(SlugError::InvalidCharacters);
        }
        Ok(Self(s.to_owned()))
    }

    /// This slug with a `-{n}` collision suffix.
    #[must_use]
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    /// Get the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_collapses_separators() {
        assert_eq!(Slug::from_name("  Red -- Cotton_Shirt!  ").unwrap().as_str(), "red-cotton-shirt");
        assert_eq!(Slug::from_name("Tee 2.0").unwrap().as_str(), "tee-2-0");
    }

    #[test]
    fn test_from_name_transliterates() {
        assert_eq!(Slug::from_name("Café Noir").unwrap().as_str(), "cafe-noir");
        assert_eq!(Slug::from_name("Ágbádá Set").unwrap().as_str(), "agbada-set");
        assert_eq!(Slug::from_name("Crème Brûlée Tee").unwrap().as_str(), "creme-brulee-tee");
    }

    #[test]
    fn test_from_name_non_latin_still_yields_slug() {
        let slug = Slug::from_name("日本").unwrap();
        assert!(Slug::parse(slug.as_str()).is_ok());
    }

    #[test]
    fn test_parse_round_trips_generated_slugs() {
        let slug = Slug::from_name("Linen Trousers").unwrap().with_suffix(3);
        assert_eq!(Slug::parse(slug.as_str()).unwrap(), slug);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Slug::parse("-red"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("red--shirt"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("Red"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
    }
}
