//! Slug and SKU generation.
//!
//! Both generators check candidates against the store and give up after a
//! fixed number of attempts. The unique constraints on `storefront.product`
//! remain the final arbiter: a candidate that passes here can still lose a
//! race at insert time, which [`super::CatalogService`] handles by
//! regenerating.

use rand::Rng;
use tracing::{debug, instrument};

use threadline_core::{Sku, Slug};

use super::error::IdentityError;
use crate::services::store::CatalogStore;

/// Attempt bound used when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 25;

/// Produces slugs and SKUs that are not yet taken.
pub struct IdentityGenerator<'a, S> {
    store: &'a S,
    max_attempts: u32,
}

impl<'a, S: CatalogStore> IdentityGenerator<'a, S> {
    /// `max_attempts` below 1 is treated as 1.
    #[must_use]
    pub const fn new(store: &'a S, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }

    /// Slug for `name`, suffixed `-1`, `-2`, ... until unused.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidName` if `name` has nothing
    /// alphanumeric once transliterated, and `IdentityError::RetryExhausted` if every candidate
    /// is taken.
    #[instrument(skip(self))]
    pub async fn generate_slug(&self, name: &str) -> Result<Slug, IdentityError> {
        let base = Slug::from_name(name)?;
        if !self.store.slug_exists(&base).await? {
            return Ok(base);
        }

        for n in 1..self.max_attempts {
            let candidate = base.with_suffix(n);
            if !self.store.slug_exists(&candidate).await? {
                debug!(slug = %candidate, "Resolved slug collision");
                return Ok(candidate);
            }
        }

        Err(IdentityError::RetryExhausted {
            field: "slug",
            attempts: self.max_attempts,
        })
    }

    /// SKU `{BRAND}-{PRODUCT}-{SIZE}-{NNNN}`, re-rolling `NNNN` until unused.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidSku` if the code is too long to store
    /// and `IdentityError::RetryExhausted` if every candidate is taken.
    #[instrument(skip(self, rng))]
    pub async fn generate_sku<R>(
        &self,
        name: &str,
        brand: &str,
        sizes: &[String],
        rng: &mut R,
    ) -> Result<Sku, IdentityError>
    where
        R: Rng + Send,
    {
        for _ in 0..self.max_attempts {
            let suffix = rng.random_range(Sku::SUFFIX_MIN..=Sku::SUFFIX_MAX);
            let candidate = Sku::parse(Sku::candidate(name, brand, sizes, suffix).as_str())?;
            if !self.store.sku_exists(&candidate).await? {
                return Ok(candidate);
            }
            debug!(sku = %candidate, "SKU collision, re-rolling");
        }

        Err(IdentityError::RetryExhausted {
            field: "sku",
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use regex::Regex;

    use threadline_core::Price;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewCatalogEntry, NewProduct};

    async fn seed(store: &MemoryStore, slug: &str, sku: &str) {
        store
            .insert_product(&NewCatalogEntry {
                product: NewProduct {
                    name: "Seed".to_string(),
                    brand: "Acme".to_string(),
                    price: Price::parse("1").unwrap(),
                    size: vec!["M".to_string()],
                    color: vec!["#000".to_string()],
                },
                slug: Slug::parse(slug).unwrap(),
                sku: Sku::parse(sku).unwrap(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_slug_on_empty_catalog() {
        let store = MemoryStore::new();
        let generator = IdentityGenerator::new(&store, DEFAULT_MAX_ATTEMPTS);

        let slug = generator.generate_slug("Red Cotton Shirt").await.unwrap();
        assert_eq!(slug.as_str(), "red-cotton-shirt");
    }

    #[tokio::test]
    async fn test_slug_collision_appends_suffix() {
        let store = MemoryStore::new();
        seed(&store, "red-cotton-shirt", "SEED-1").await;
        let generator = IdentityGenerator::new(&store, DEFAULT_MAX_ATTEMPTS);

        let slug = generator.generate_slug("Red Cotton Shirt").await.unwrap();
        assert_eq!(slug.as_str(), "red-cotton-shirt-1");

        seed(&store, "red-cotton-shirt-1", "SEED-2").await;
        let slug = generator.generate_slug("Red Cotton Shirt").await.unwrap();
        assert_eq!(slug.as_str(), "red-cotton-shirt-2");
    }

    #[tokio::test]
    async fn test_slug_retry_is_bounded() {
        let store = MemoryStore::new();
        seed(&store, "shirt", "SEED-1").await;
        seed(&store, "shirt-1", "SEED-2").await;
        let generator = IdentityGenerator::new(&store, 2);

        let err = generator.generate_slug("Shirt").await.unwrap_err();
        assert!(matches!(
            err,
            IdentityError::RetryExhausted {
                field: "slug",
                attempts: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_slug_requires_alphanumerics() {
        let store = MemoryStore::new();
        let generator = IdentityGenerator::new(&store, DEFAULT_MAX_ATTEMPTS);
        assert!(matches!(
            generator.generate_slug("!!!").await,
            Err(IdentityError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_sku_pattern() {
        let store = MemoryStore::new();
        let generator = IdentityGenerator::new(&store, DEFAULT_MAX_ATTEMPTS);
        let mut rng = StdRng::seed_from_u64(7);

        let sku = generator
            .generate_sku("Red Shirt", "Acme", &["M".to_string()], &mut rng)
            .await
            .unwrap();
        assert!(Regex::new(r"^ACM-RED-M-\d{4}$").unwrap().is_match(sku.as_str()));
    }

    #[tokio::test]
    async fn test_sku_collision_rerolls() {
        let store = MemoryStore::new();
        let generator = IdentityGenerator::new(&store, DEFAULT_MAX_ATTEMPTS);
        let sizes = ["M".to_string()];

        let first = generator
            .generate_sku("Red Shirt", "Acme", &sizes, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();
        seed(&store, "red-shirt", first.as_str()).await;

        // Same seed, so the first roll collides.
        let second = generator
            .generate_sku("Red Shirt", "Acme", &sizes, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();
        assert_ne!(first, second);
        assert!(second.as_str().starts_with("ACM-RED-M-"));
    }

    #[tokio::test]
    async fn test_sku_retry_is_bounded() {
        let store = MemoryStore::new();
        let generator = IdentityGenerator::new(&store, 1);
        let sizes = ["M".to_string()];

        let taken = generator
            .generate_sku("Red Shirt", "Acme", &sizes, &mut StdRng::seed_from_u64(3))
            .await
            .unwrap();
        seed(&store, "red-shirt", taken.as_str()).await;

        let err = generator
            .generate_sku("Red Shirt", "Acme", &sizes, &mut StdRng::seed_from_u64(3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IdentityError::RetryExhausted {
                field: "sku",
                attempts: 1
            }
        ));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let store = MemoryStore::new();
        let generator = IdentityGenerator::new(&store, 0);
        assert_eq!(generator.max_attempts, 1);
    }
}
