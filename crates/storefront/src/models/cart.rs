//! Cart domain types.
//!
//! Signed-in shoppers keep their lines in `storefront.cart_line`; guests keep
//! a [`GuestCart`] in their session. Both are exposed as [`CartLine`]s so the
//! rest of the crate never needs to know which backend served a request.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use threadline_core::{CartLineId, Price, ProductId, UserId};

/// Largest quantity a line can hold (`INTEGER` column).
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// Who a cart operation is performed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shopper {
    /// Signed-in shopper with a persistent cart.
    Authenticated(UserId),
    /// Anonymous shopper whose cart lives in the session.
    Guest,
}

impl Shopper {
    /// The user id, if signed in.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Authenticated(id) => Some(*id),
            Self::Guest => None,
        }
    }
}

/// One cart row.
///
/// For guests `id` is the line's key inside the session cart and `user_id` is
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: Option<UserId>,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Product price when the line was created. Never recomputed.
    pub unit_price: Price,
    pub size: Vec<String>,
    pub color: Vec<String>,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }

    /// Overwrite the fields set in `changes`.
    pub fn apply(&mut self, changes: &LineChanges) {
        if let Some(quantity) = changes.quantity {
            self.quantity = quantity;
        }
        if let Some(size) = &changes.size {
            self.size.clone_from(size);
        }
        if let Some(color) = &changes.color {
            self.color.clone_from(color);
        }
    }
}

/// A line to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    pub user_id: Option<UserId>,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
    pub size: Vec<String>,
    pub color: Vec<String>,
}

impl NewCartLine {
    /// Materialize as a stored line.
    #[must_use]
    pub fn into_line(self, id: CartLineId) -> CartLine {
        CartLine {
            id,
            user_id: self.user_id,
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            size: self.size,
            color: self.color,
        }
    }
}

/// The fields of a line that actually differ from what is stored.
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineChanges {
    pub quantity: Option<u32>,
    pub size: Option<Vec<String>>,
    pub color: Option<Vec<String>>,
}

impl LineChanges {
    /// Diff requested values against a stored line.
    ///
    /// `None` arguments are not compared. Sizes and colors must already be
    /// normalized with [`normalize_tokens`].
    #[must_use]
    pub fn between(
        line: &CartLine,
        quantity: Option<u32>,
        size: Option<&[String]>,
        color: Option<&[String]>,
    ) -> Self {
        Self {
            quantity: quantity.filter(|q| *q != line.quantity),
            size: size.filter(|s| *s != line.size.as_slice()).map(<[String]>::to_vec),
            color: color.filter(|c| *c != line.color.as_slice()).map(<[String]>::to_vec),
        }
    }

    /// Quantity-only change.
    #[must_use]
    pub const fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
            size: None,
            color: None,
        }
    }

    /// True when nothing differs.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.size.is_none() && self.color.is_none()
    }
}

/// Validated add-to-cart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Vec<String>,
    pub color: Vec<String>,
}

/// Validated full line update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateLine {
    pub quantity: u32,
    pub size: Vec<String>,
    pub color: Vec<String>,
}

/// Lines plus their monetary total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub cart_items: Vec<CartLine>,
    /// Σ `unit_price × quantity`.
    pub total: Decimal,
}

impl CartSummary {
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(CartLine::line_total).sum();
        Self {
            cart_items: lines,
            total,
        }
    }
}

/// A guest's cart as stored in the session.
///
/// Line keys are positional and stable: a new line gets one more than the
/// highest key in use, and removing a line leaves the others' keys alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCart {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl GuestCart {
    /// Append a new line, never merging with an existing one. Returns its key.
    pub fn push(&mut self, line: NewCartLine) -> CartLineId {
        let key = self
            .lines
            .iter()
            .map(|l| l.id.as_i32())
            .max()
            .map_or(CartLineId::new(0), |max| CartLineId::new(max.saturating_add(1)));
        self.lines.push(line.into_line(key));
        key
    }

    /// Line by key.
    #[must_use]
    pub fn get(&self, key: CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == key)
    }

    /// Apply changes to the line with `key`. Returns false if absent.
    pub fn apply(&mut self, key: CartLineId, changes: &LineChanges) -> bool {
        match self.lines.iter_mut().find(|l| l.id == key) {
            Some(line) => {
                line.apply(changes);
                true
            }
            None => false,
        }
    }

    /// Remove the line with `key`. Returns false if absent.
    pub fn remove(&mut self, key: CartLineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != key);
        self.lines.len() != before
    }

    /// Whether any line references `product_id`.
    #[must_use]
    pub fn contains_product(&self, product_id: ProductId) -> bool {
        self.lines.iter().any(|l| l.product_id == product_id)
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Normalize a size/color token list into set form: trimmed, without empty
/// tokens, sorted and deduplicated.
#[must_use]
pub fn normalize_tokens<I, S>(tokens: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = tokens
        .into_iter()
        .map(|t| t.as_ref().trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}
