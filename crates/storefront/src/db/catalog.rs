//! Catalog repository.
//!
//! Queries are checked at runtime (`sqlx::query_as::<_, Row>`), so building
//! the crate does not need a live database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;

use threadline_core::{Price, ProductId, Sku, Slug};

use super::{PgStore, RepositoryError, map_unique_violation};
use crate::models::{CatalogEntry, NewCatalogEntry};
use crate::services::store::CatalogStore;

const ENTRY_COLUMNS: &str = "id, name, brand, price, size, color, slug, sku, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CatalogEntryRow {
    id: i32,
    name: String,
    brand: String,
    price: Decimal,
    size: Json<Vec<String>>,
    color: Json<Vec<String>>,
    slug: String,
    sku: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CatalogEntryRow> for CatalogEntry {
    type Error = RepositoryError;

    fn try_from(row: CatalogEntryRow) -> Result<Self, Self::Error> {
        let price = Price::from_decimal(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;
        let slug = Slug::parse(&row.slug).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid slug for product {}: {e}", row.id))
        })?;
        let sku = Sku::parse(&row.sku).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid sku for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            brand: row.brand,
            price,
            size: row.size.0,
            color: row.color.0,
            slug,
            sku,
            created_at: row.created_at,
        })
    }
}

impl CatalogStore for PgStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<CatalogEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, CatalogEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(CatalogEntry::try_from).transpose()
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<CatalogEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, CatalogEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM storefront.product WHERE slug = $1"
        ))
        .bind(slug.as_str())
        .fetch_optional(self.pool())
        .await?;

        row.map(CatalogEntry::try_from).transpose()
    }

    async fn slug_exists(&self, slug: &Slug) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM storefront.product WHERE slug = $1)",
        )
        .bind(slug.as_str())
        .fetch_one(self.pool())
        .await?;

        Ok(exists)
    }

    async fn sku_exists(&self, sku: &Sku) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM storefront.product WHERE sku = $1)",
        )
        .bind(sku.as_str())
        .fetch_one(self.pool())
        .await?;

        Ok(exists)
    }

    async fn insert_product(&self, entry: &NewCatalogEntry) -> Result<CatalogEntry, RepositoryError> {
        let product = &entry.product;
        let row = sqlx::query_as::<_, CatalogEntryRow>(&format!(
            r"
            INSERT INTO storefront.product (name, brand, price, size, color, slug, sku)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ENTRY_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.brand)
        .bind(product.price.amount())
        .bind(Json(&product.size))
        .bind(Json(&product.color))
        .bind(entry.slug.as_str())
        .bind(entry.sku.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(map_unique_violation)?;

        CatalogEntry::try_from(row)
    }
}
