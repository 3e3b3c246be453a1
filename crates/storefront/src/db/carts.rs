//! Cart line repository.
//!
//! Read-modify-write sequences run inside a [`PgCartTx`]. Reads that precede a
//! write lock: `find_by_product` serializes on a transaction-scoped advisory
//! lock for the (user, product) pair and `find_by_id` takes the row lock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use threadline_core::{CartLineId, Price, ProductId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{CartLine, LineChanges, NewCartLine};
use crate::services::store::{CartStore, CartTransaction};

const LINE_COLUMNS: &str = "id, user_id, product_id, quantity, unit_price, size, color";

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartLineId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
    size: Json<Vec<String>>,
    color: Json<Vec<String>>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid quantity {} for cart line {}",
                    row.quantity, row.id
                ))
            })?;
        let unit_price = Price::from_decimal(row.unit_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for cart line {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            user_id: Some(row.user_id),
            product_id: row.product_id,
            quantity,
            unit_price,
            size: row.size.0,
            color: row.color.0,
        })
    }
}

fn quantity_column(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("quantity {quantity} out of range")))
}

fn into_lines(rows: Vec<CartLineRow>) -> Result<Vec<CartLine>, RepositoryError> {
    rows.into_iter().map(CartLine::try_from).collect()
}

impl CartStore for PgStore {
    type Tx = PgCartTx;

    async fn lines_for(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM storefront.cart_line WHERE user_id = $1 ORDER BY id DESC"
        ))
        .bind(user)
        .fetch_all(self.pool())
        .await?;

        into_lines(rows)
    }

    async fn count_lines(&self, user: UserId) -> Result<u64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.cart_line WHERE user_id = $1",
        )
        .bind(user)
        .fetch_one(self.pool())
        .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative line count {count}")))
    }

    async fn has_product(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM storefront.cart_line WHERE user_id = $1 AND product_id = $2
            )
            ",
        )
        .bind(user)
        .bind(product)
        .fetch_one(self.pool())
        .await?;

        Ok(exists)
    }

    async fn lines_for_product(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            SELECT {LINE_COLUMNS} FROM storefront.cart_line
            WHERE user_id = $1 AND product_id = $2
            ORDER BY id DESC
            "
        ))
        .bind(user)
        .bind(product)
        .fetch_all(self.pool())
        .await?;

        into_lines(rows)
    }

    async fn begin(&self) -> Result<PgCartTx, RepositoryError> {
        Ok(PgCartTx {
            tx: self.pool().begin().await?,
        })
    }
}

/// An open cart transaction. Rolled back on drop unless committed.
#[derive(Debug)]
pub struct PgCartTx {
    tx: Transaction<'static, Postgres>,
}

impl CartTransaction for PgCartTx {
    async fn find_by_product(
        &mut self,
        user: UserId,
        product: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        // Row locks alone do not cover the "no line yet" case.
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(user)
            .bind(product)
            .execute(&mut *self.tx)
            .await?;

        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            SELECT {LINE_COLUMNS} FROM storefront.cart_line
            WHERE user_id = $1 AND product_id = $2
            ORDER BY id
            LIMIT 1
            FOR UPDATE
            "
        ))
        .bind(user)
        .bind(product)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(CartLine::try_from).transpose()
    }

    async fn find_by_id(
        &mut self,
        user: UserId,
        id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM storefront.cart_line WHERE id = $1 AND user_id = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(user)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(CartLine::try_from).transpose()
    }

    async fn insert_line(&mut self, line: &NewCartLine) -> Result<CartLine, RepositoryError> {
        let user = line.user_id.ok_or_else(|| {
            RepositoryError::DataCorruption("persistent cart line without a user".to_string())
        })?;

        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            INSERT INTO storefront.cart_line (user_id, product_id, quantity, unit_price, size, color)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LINE_COLUMNS}
            "
        ))
        .bind(user)
        .bind(line.product_id)
        .bind(quantity_column(line.quantity)?)
        .bind(line.unit_price.amount())
        .bind(Json(&line.size))
        .bind(Json(&line.color))
        .fetch_one(&mut *self.tx)
        .await?;

        CartLine::try_from(row)
    }

    async fn update_line(
        &mut self,
        id: CartLineId,
        changes: &LineChanges,
    ) -> Result<CartLine, RepositoryError> {
        let quantity = changes.quantity.map(quantity_column).transpose()?;

        let row = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            UPDATE storefront.cart_line
            SET quantity = COALESCE($2, quantity),
                size = COALESCE($3, size),
                color = COALESCE($4, color),
                updated_at = now()
            WHERE id = $1
            RETURNING {LINE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(quantity)
        .bind(changes.size.as_ref().map(Json))
        .bind(changes.color.as_ref().map(Json))
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        CartLine::try_from(row)
    }

    async fn delete_line(&mut self, user: UserId, id: CartLineId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_line WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&mut self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.cart_line WHERE user_id = $1")
            .bind(user)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// A persistent cart line that was never checked out.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AbandonedLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Cart lines created before `cutoff` with no checkout, ordered by user.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn abandoned_lines(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<AbandonedLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, AbandonedLine>(
        r"
        SELECT c.user_id, c.product_id, p.name AS product_name, c.quantity, c.created_at
        FROM storefront.cart_line c
        JOIN storefront.product p ON p.id = c.product_id
        WHERE c.checkout_at IS NULL AND c.created_at < $1
        ORDER BY c.user_id, c.created_at
        ",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(lines)
}
