//! Persistence ports consumed by the cart and catalog services.
//!
//! [`crate::db::PgStore`] is the production implementation and
//! [`crate::db::MemoryStore`] the in-process one used by tests.

use std::future::Future;

use threadline_core::{CartLineId, ProductId, Sku, Slug, UserId};

use crate::db::RepositoryError;
use crate::models::{CartLine, CatalogEntry, LineChanges, NewCartLine, NewCatalogEntry};

/// Catalog reads and writes.
///
/// Slug and SKU uniqueness is enforced by the store: `insert_product`
/// returns [`RepositoryError::Conflict`] when either is already taken.
pub trait CatalogStore: Send + Sync {
    /// Get a catalog entry by id.
    fn find_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<CatalogEntry>, RepositoryError>> + Send;

    /// Get a catalog entry by slug.
    fn find_by_slug(
        &self,
        slug: &Slug,
    ) -> impl Future<Output = Result<Option<CatalogEntry>, RepositoryError>> + Send;

    fn slug_exists(&self, slug: &Slug) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn sku_exists(&self, sku: &Sku) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Insert a new catalog entry.
    fn insert_product(
        &self,
        entry: &NewCatalogEntry,
    ) -> impl Future<Output = Result<CatalogEntry, RepositoryError>> + Send;
}

/// Persistent carts of signed-in shoppers.
pub trait CartStore: Send + Sync {
    type Tx: CartTransaction;

    /// All lines of `user`, newest first.
    fn lines_for(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<CartLine>, RepositoryError>> + Send;

    /// Number of lines of `user`.
    fn count_lines(&self, user: UserId) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Whether `user` has any line for `product`.
    fn has_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Lines of `user` for `product`, newest first.
    fn lines_for_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> impl Future<Output = Result<Vec<CartLine>, RepositoryError>> + Send;

    /// Open a transaction. Dropping it without [`CartTransaction::commit`]
    /// rolls every write back.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, RepositoryError>> + Send;
}

/// Writes to persistent carts, grouped in one atomic unit.
pub trait CartTransaction: Send {
    /// The oldest line of `user` for `product`, locked until the transaction
    /// ends. Concurrent callers for the same pair wait for each other.
    fn find_by_product(
        &mut self,
        user: UserId,
        product: ProductId,
    ) -> impl Future<Output = Result<Option<CartLine>, RepositoryError>> + Send;

    /// A line of `user` by id, locked until the transaction ends.
    fn find_by_id(
        &mut self,
        user: UserId,
        id: CartLineId,
    ) -> impl Future<Output = Result<Option<CartLine>, RepositoryError>> + Send;

    fn insert_line(
        &mut self,
        line: &NewCartLine,
    ) -> impl Future<Output = Result<CartLine, RepositoryError>> + Send;

    /// Write the `Some` fields of `changes` to line `id`.
    ///
    /// Returns [`RepositoryError::NotFound`] if the line does not exist.
    fn update_line(
        &mut self,
        id: CartLineId,
        changes: &LineChanges,
    ) -> impl Future<Output = Result<CartLine, RepositoryError>> + Send;

    /// Delete one line of `user`. Returns whether it existed.
    fn delete_line(
        &mut self,
        user: UserId,
        id: CartLineId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every line of `user`. Returns the number removed.
    fn delete_all(&mut self, user: UserId) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
