//! Catalog service: product creation and lookup.

mod error;
pub mod identity;

use rand::Rng;
use tracing::{info, instrument, warn};

use threadline_core::Slug;

pub use error::{CatalogError, IdentityError};
pub use identity::{DEFAULT_MAX_ATTEMPTS, IdentityGenerator};

use crate::db::RepositoryError;
use crate::models::{CatalogEntry, NewCatalogEntry, NewProduct};
use crate::services::store::CatalogStore;

/// Catalog operations backed by a [`CatalogStore`].
pub struct CatalogService<'a, S> {
    store: &'a S,
    max_attempts: u32,
}

impl<'a, S: CatalogStore> CatalogService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }

    /// Create a product with a fresh slug and SKU.
    ///
    /// A unique violation at insert time (another writer took the slug or SKU
    /// first) triggers regeneration of both, within the same attempt bound.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Identity` if no unique slug or SKU is found and
    /// `CatalogError::Repository` if the insert fails otherwise.
    #[instrument(skip(self, product, rng), fields(name = %product.name))]
    pub async fn create_product<R>(
        &self,
        product: NewProduct,
        rng: &mut R,
    ) -> Result<CatalogEntry, CatalogError>
    where
        R: Rng + Send,
    {
        let identities = IdentityGenerator::new(self.store, self.max_attempts);
        let mut entry = NewCatalogEntry {
            slug: identities.generate_slug(&product.name).await?,
            sku: identities
                .generate_sku(&product.name, &product.brand, &product.size, rng)
                .await?,
            product,
        };

        let mut attempt = 1;
        loop {
            match self.store.insert_product(&entry).await {
                Ok(created) => {
                    info!(product_id = %created.id, slug = %created.slug, sku = %created.sku, "Product created");
                    return Ok(created);
                }
                Err(RepositoryError::Conflict(constraint)) if attempt < self.max_attempts => {
                    warn!(attempt, %constraint, "Identity taken at insert, regenerating");
                    attempt += 1;
                    entry.slug = identities.generate_slug(&entry.product.name).await?;
                    entry.sku = identities
                        .generate_sku(
                            &entry.product.name,
                            &entry.product.brand,
                            &entry.product.size,
                            rng,
                        )
                        .await?;
                }
                Err(RepositoryError::Conflict(constraint)) => {
                    let field = if constraint.contains("sku") { "sku" } else { "slug" };
                    return Err(IdentityError::RetryExhausted {
                        field,
                        attempts: attempt,
                    }
                    .into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Catalog entry by slug.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the slug is malformed or unknown.
    #[instrument(skip(self))]
    pub async fn show_product(&self, slug: &str) -> Result<CatalogEntry, CatalogError> {
        let Ok(slug) = Slug::parse(slug) else {
            return Err(CatalogError::NotFound);
        };
        self.store
            .find_by_slug(&slug)
            .await?
            .ok_or(CatalogError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use threadline_core::Price;

    use super::*;
    use crate::db::MemoryStore;

    fn shirt() -> NewProduct {
        NewProduct {
            name: "Red Cotton Shirt".to_string(),
            brand: "Acme".to_string(),
            price: Price::parse("19.99").unwrap(),
            size: vec!["M".to_string()],
            color: vec!["#ff0000".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_product_generates_identities() {
        let store = MemoryStore::new();
        let service = CatalogService::new(&store, DEFAULT_MAX_ATTEMPTS);
        let mut rng = StdRng::seed_from_u64(11);

        let first = service.create_product(shirt(), &mut rng).await.unwrap();
        let second = service.create_product(shirt(), &mut rng).await.unwrap();

        assert_eq!(first.slug.as_str(), "red-cotton-shirt");
        assert_eq!(second.slug.as_str(), "red-cotton-shirt-1");
        assert!(first.sku.as_str().starts_with("ACM-RED-M-"));
        assert_ne!(first.sku, second.sku);
    }

    #[tokio::test]
    async fn test_sku_sizes_follow_listed_order() {
        let store = MemoryStore::new();
        let service = CatalogService::new(&store, DEFAULT_MAX_ATTEMPTS);
        let product = NewProduct {
            size: vec!["XL".to_string(), "M".to_string()],
            ..shirt()
        };

        let created = service
            .create_product(product, &mut StdRng::seed_from_u64(5))
            .await
            .unwrap();

        assert!(created.sku.as_str().starts_with("ACM-RED-XL-M-"));
        assert_eq!(created.size, vec!["XL".to_string(), "M".to_string()]);
    }

    #[tokio::test]
    async fn test_insert_conflict_is_retried() {
        let store = MemoryStore::new();
        let service = CatalogService::new(&store, DEFAULT_MAX_ATTEMPTS);
        store.conflict_next_inserts(2);

        let created = service
            .create_product(shirt(), &mut StdRng::seed_from_u64(5))
            .await
            .unwrap();

        assert_eq!(created.slug.as_str(), "red-cotton-shirt");
        assert_eq!(store.product_count().await, 1);
    }

    #[tokio::test]
    async fn test_insert_conflicts_exhaust_retries() {
        let store = MemoryStore::new();
        let service = CatalogService::new(&store, 3);
        store.conflict_next_inserts(3);

        let err = service
            .create_product(shirt(), &mut StdRng::seed_from_u64(5))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Identity(IdentityError::RetryExhausted { attempts: 3, .. })
        ));
        assert_eq!(store.product_count().await, 0);
    }

    #[tokio::test]
    async fn test_show_product() {
        let store = MemoryStore::new();
        let service = CatalogService::new(&store, DEFAULT_MAX_ATTEMPTS);
        let created = service
            .create_product(shirt(), &mut StdRng::seed_from_u64(5))
            .await
            .unwrap();

        let found = service.show_product("red-cotton-shirt").await.unwrap();
        assert_eq!(found.id, created.id);

        assert!(matches!(
            service.show_product("missing").await,
            Err(CatalogError::NotFound)
        ));
        assert!(matches!(
            service.show_product("Not A Slug").await,
            Err(CatalogError::NotFound)
        ));
    }
}
