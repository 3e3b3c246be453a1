//! Catalog entry types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{Price, ProductId, Sku, Slug};

/// A sellable product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: Price,
    pub size: Vec<String>,
    pub color: Vec<String>,
    pub slug: Slug,
    pub sku: Sku,
    pub created_at: DateTime<Utc>,
}

/// A validated product creation request, before identity generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    pub price: Price,
    pub size: Vec<String>,
    pub color: Vec<String>,
}

/// A product ready for insertion, with its generated slug and SKU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCatalogEntry {
    pub product: NewProduct,
    pub slug: Slug,
    pub sku: Sku,
}
