//! In-process store.
//!
//! Implements the same ports as [`super::PgStore`] over a mutex-guarded map.
//! A [`MemoryTx`] holds the lock for its whole lifetime and works on a copy
//! of the state that only replaces the shared state on commit, so an
//! uncommitted or failed transaction leaves no trace. Faults can be injected
//! to exercise failure paths.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use threadline_core::{CartLineId, Price, ProductId, Sku, Slug, UserId};

use super::RepositoryError;
use crate::models::{CartLine, CatalogEntry, LineChanges, NewCartLine, NewCatalogEntry};
use crate::services::store::{CartStore, CartTransaction, CatalogStore};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: BTreeMap<ProductId, CatalogEntry>,
    lines: BTreeMap<CartLineId, CartLine>,
    last_product_id: i32,
    last_line_id: i32,
}

impl MemoryState {
    fn user_lines(&self, user: UserId) -> impl DoubleEndedIterator<Item = &CartLine> {
        self.lines
            .values()
            .filter(move |l| l.user_id == Some(user))
    }
}

#[derive(Debug, Default)]
struct Faults {
    fail_commits: AtomicBool,
    fail_reads: AtomicBool,
    conflicting_inserts: AtomicU32,
}

fn injected_failure() -> RepositoryError {
    RepositoryError::Database(sqlx::Error::PoolTimedOut)
}

/// In-memory catalog and cart store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent commit fail (and roll back).
    pub fn fail_commits(&self, fail: bool) {
        self.faults.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent cart read outside a transaction fail.
    pub fn fail_reads(&self, fail: bool) {
        self.faults.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make the next `n` product inserts fail with a unique violation, as a
    /// concurrent writer taking the same slug would.
    pub fn conflict_next_inserts(&self, n: u32) {
        self.faults.conflicting_inserts.store(n, Ordering::SeqCst);
    }

    /// Change a product's current price.
    pub async fn reprice(&self, id: ProductId, price: Price) {
        if let Some(product) = self.state.lock().await.products.get_mut(&id) {
            product.price = price;
        }
    }

    /// Every stored cart line, in id order.
    pub async fn all_lines(&self) -> Vec<CartLine> {
        self.state.lock().await.lines.values().cloned().collect()
    }

    /// Number of stored products.
    pub async fn product_count(&self) -> usize {
        self.state.lock().await.products.len()
    }

    fn check_reads(&self) -> Result<(), RepositoryError> {
        if self.faults.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }

    fn take_injected_conflict(&self) -> bool {
        self.faults
            .conflicting_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl CatalogStore for MemoryStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<CatalogEntry>, RepositoryError> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<CatalogEntry>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .products
            .values()
            .find(|p| &p.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &Slug) -> Result<bool, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .products
            .values()
            .any(|p| &p.slug == slug))
    }

    async fn sku_exists(&self, sku: &Sku) -> Result<bool, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .products
            .values()
            .any(|p| &p.sku == sku))
    }

    async fn insert_product(&self, entry: &NewCatalogEntry) -> Result<CatalogEntry, RepositoryError> {
        if self.take_injected_conflict() {
            return Err(RepositoryError::Conflict("product_slug_key".to_string()));
        }

        let mut state = self.state.lock().await;
        if state.products.values().any(|p| p.slug == entry.slug) {
            return Err(RepositoryError::Conflict("product_slug_key".to_string()));
        }
        if state.products.values().any(|p| p.sku == entry.sku) {
            return Err(RepositoryError::Conflict("product_sku_key".to_string()));
        }

        state.last_product_id += 1;
        let product = &entry.product;
        let stored = CatalogEntry {
            id: ProductId::new(state.last_product_id),
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price,
            size: product.size.clone(),
            color: product.color.clone(),
            slug: entry.slug.clone(),
            sku: entry.sku.clone(),
            created_at: Utc::now(),
        };
        state.products.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

impl CartStore for MemoryStore {
    type Tx = MemoryTx;

    async fn lines_for(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        self.check_reads()?;
        Ok(self.state.lock().await.user_lines(user).rev().cloned().collect())
    }

    async fn count_lines(&self, user: UserId) -> Result<u64, RepositoryError> {
        self.check_reads()?;
        Ok(self.state.lock().await.user_lines(user).count() as u64)
    }

    async fn has_product(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        self.check_reads()?;
        Ok(self
            .state
            .lock()
            .await
            .user_lines(user)
            .any(|l| l.product_id == product))
    }

    async fn lines_for_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        self.check_reads()?;
        Ok(self
            .state
            .lock()
            .await
            .user_lines(user)
            .rev()
            .filter(|l| l.product_id == product)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<MemoryTx, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = (*guard).clone();
        Ok(MemoryTx {
            guard,
            working,
            faults: Arc::clone(&self.faults),
        })
    }
}

/// Transaction over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Faults>,
}

impl CartTransaction for MemoryTx {
    async fn find_by_product(
        &mut self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(self
            .working
            .user_lines(user)
            .find(|l| l.product_id == product)
            .cloned())
    }

    async fn find_by_id(
        &mut self,
        user: UserId,
        id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(self
            .working
            .lines
            .get(&id)
            .filter(|l| l.user_id == Some(user))
            .cloned())
    }

    async fn insert_line(&mut self, line: &NewCartLine) -> Result<CartLine, RepositoryError> {
        if line.user_id.is_none() {
            return Err(RepositoryError::DataCorruption(
                "persistent cart line without a user".to_string(),
            ));
        }
        self.working.last_line_id += 1;
        let stored = line.clone().into_line(CartLineId::new(self.working.last_line_id));
        self.working.lines.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_line(
        &mut self,
        id: CartLineId,
        changes: &LineChanges,
    ) -> Result<CartLine, RepositoryError> {
        let line = self
            .working
            .lines
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        line.apply(changes);
        Ok(line.clone())
    }

    async fn delete_line(&mut self, user: UserId, id: CartLineId) -> Result<bool, RepositoryError> {
        let owned = self
            .working
            .lines
            .get(&id)
            .is_some_and(|l| l.user_id == Some(user));
        if owned {
            self.working.lines.remove(&id);
        }
        Ok(owned)
    }

    async fn delete_all(&mut self, user: UserId) -> Result<u64, RepositoryError> {
        let before = self.working.lines.len();
        self.working.lines.retain(|_, l| l.user_id != Some(user));
        Ok((before - self.working.lines.len()) as u64)
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        if self.faults.fail_commits.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let Self {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(user: i32, product: i32) -> NewCartLine {
        NewCartLine {
            user_id: Some(UserId::new(user)),
            product_id: ProductId::new(product),
            quantity: 1,
            unit_price: Price::parse("10").unwrap(),
            size: vec!["M".to_string()],
            color: vec!["red".to_string()],
        }
    }

    #[tokio::test]
    async fn test_uncommitted_transaction_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_line(&line(1, 1)).await.unwrap();
        }
        assert!(store.all_lines().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back() {
        let store = MemoryStore::new();
        store.fail_commits(true);

        let mut tx = store.begin().await.unwrap();
        tx.insert_line(&line(1, 1)).await.unwrap();
        assert!(tx.commit().await.is_err());

        assert!(store.all_lines().await.is_empty());
    }

    #[tokio::test]
    async fn test_lines_are_scoped_to_user_and_newest_first() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_line(&line(1, 1)).await.unwrap();
        tx.insert_line(&line(2, 1)).await.unwrap();
        tx.insert_line(&line(1, 2)).await.unwrap();
        tx.commit().await.unwrap();

        let lines = store.lines_for(UserId::new(1)).await.unwrap();
        let products: Vec<_> = lines.iter().map(|l| l.product_id.as_i32()).collect();
        assert_eq!(products, vec![2, 1]);
        assert_eq!(store.count_lines(UserId::new(2)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_line_ignores_other_users() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let other = tx.insert_line(&line(2, 1)).await.unwrap();
        assert!(!tx.delete_line(UserId::new(1), other.id).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(store.all_lines().await.len(), 1);
    }
}
