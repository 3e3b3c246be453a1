//! Cart report commands.
//!
//! # Usage
//!
//! ```bash
//! tl-cli carts abandoned --older-than-days 2
//! ```
//!
//! Only signed-in carts are visible here; guest carts live in sessions.

use chrono::{DateTime, Duration, Utc};

use threadline_core::UserId;
use threadline_storefront::db::{AbandonedLine, abandoned_lines};

use super::{CommandError, database_url};

/// One user's abandoned lines.
#[derive(Debug)]
pub struct AbandonedCart {
    pub user_id: UserId,
    pub lines: Vec<AbandonedLine>,
}

/// Group lines (ordered by user) into one cart per user.
#[must_use]
pub fn group_by_user(lines: Vec<AbandonedLine>) -> Vec<AbandonedCart> {
    let mut carts: Vec<AbandonedCart> = Vec::new();
    for line in lines {
        match carts.last_mut() {
            Some(cart) if cart.user_id == line.user_id => cart.lines.push(line),
            _ => carts.push(AbandonedCart {
                user_id: line.user_id,
                lines: vec![line],
            }),
        }
    }
    carts
}

fn cutoff(now: DateTime<Utc>, older_than_days: u32) -> Result<DateTime<Utc>, CommandError> {
    Duration::try_days(i64::from(older_than_days))
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or(CommandError::InvalidCutoff(older_than_days))
}

/// Log every user whose cart has lines older than `older_than_days`.
///
/// # Errors
///
/// Returns `CommandError` if `older_than_days` reaches past the earliest
/// representable date, the database is unreachable, or the query fails.
pub async fn abandoned(older_than_days: u32) -> Result<usize, CommandError> {
    let cutoff = cutoff(Utc::now(), older_than_days)?;
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = threadline_storefront::db::create_pool(&database_url).await?;

    let carts = group_by_user(abandoned_lines(&pool, cutoff).await?);

    for cart in &carts {
        let products: Vec<&str> = cart
            .lines
            .iter()
            .map(|line| line.product_name.as_str())
            .collect();
        tracing::info!(
            user_id = %cart.user_id,
            lines = cart.lines.len(),
            products = ?products,
            "Abandoned cart"
        );
    }

    tracing::info!(
        "{} abandoned cart(s) with lines older than {} day(s)",
        carts.len(),
        older_than_days
    );
    Ok(carts.len())
}
