//! Cart service.
//!
//! One entry point for "what is in the shopper's cart", whichever backend
//! holds it: signed-in shoppers are served from the [`CartStore`], guests from
//! the [`GuestCart`] kept in their session.
//!
//! Persistent writes run in a single [`CartTransaction`] per operation and are
//! rolled back as a whole on failure. Guest writes are one session write each.

mod error;

use std::str::FromStr;

use tracing::{info, instrument, warn};

use threadline_core::{CartLineId, ProductId, UserId};

pub use error::{CartAction, CartError};

use crate::db::RepositoryError;
use crate::models::{
    AddToCart, CartLine, CartSummary, GuestCart, LineChanges, MAX_LINE_QUANTITY, NewCartLine,
    Shopper, UpdateLine, session_keys,
};
use crate::services::session::{SessionError, SessionStore};
use crate::services::store::{CartStore, CartTransaction, CatalogStore};
use crate::validation::ValidationErrors;

/// What `add` does when a signed-in shopper already has a line for the
/// product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddPolicy {
    /// Increment the existing line and create nothing else.
    #[default]
    Merge,
    /// Increment the existing line, then also insert a new line with the
    /// requested quantity.
    Legacy,
}

/// Unknown `CART_ADD_POLICY` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cart add policy '{0}', expected 'merge' or 'legacy'")]
pub struct ParsePolicyError(String);

impl FromStr for AddPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "legacy" => Ok(Self::Legacy),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

/// Result of an update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Something changed; the refreshed cart.
    Updated(CartSummary),
    /// Every requested value already matched. Nothing was written.
    NoChange,
}

fn persistence(action: CartAction) -> impl FnOnce(RepositoryError) -> CartError {
    move |source| {
        tracing::error!(error = %source, %action, "Cart persistence failure");
        CartError::Persistence { action, source }
    }
}

fn session_failure(action: CartAction) -> impl FnOnce(SessionError) -> CartError {
    move |source| {
        tracing::error!(error = %source, %action, "Cart session failure");
        CartError::Session { action, source }
    }
}

fn quantity_overflow() -> CartError {
    CartError::Validation(ValidationErrors::single(
        "quantity",
        "Select the correct quantity",
    ))
}

/// Cart operations for one request.
///
/// Borrow the store and the request's session, pick the add policy, and pass
/// the [`Shopper`] to every call.
pub struct CartService<'a, S, K> {
    store: &'a S,
    session: &'a K,
    policy: AddPolicy,
}

impl<'a, S, K> CartService<'a, S, K>
where
    S: CartStore + CatalogStore,
    K: SessionStore,
{
    #[must_use]
    pub const fn new(store: &'a S, session: &'a K) -> Self {
        Self {
            store,
            session,
            policy: AddPolicy::Merge,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: AddPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// All lines of the shopper and their total. An empty cart is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence`/`Session` if the cart cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self, shopper: Shopper) -> Result<CartSummary, CartError> {
        let lines = match shopper {
            Shopper::Authenticated(user) => self
                .store
                .lines_for(user)
                .await
                .map_err(persistence(CartAction::List))?,
            Shopper::Guest => self.guest_cart(CartAction::List).await?.into_lines(),
        };
        Ok(CartSummary::from_lines(lines))
    }

    /// Add a product to the cart at its current price.
    ///
    /// Guests always get a new line. Signed-in shoppers follow the
    /// [`AddPolicy`].
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product does not exist,
    /// `CartError::Validation` if the merged quantity would overflow, and
    /// `CartError::Persistence`/`Session` if the write fails.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add(&self, shopper: Shopper, request: AddToCart) -> Result<CartSummary, CartError> {
        let action = CartAction::Add;
        let product = self
            .store
            .find_product(request.product_id)
            .await
            .map_err(persistence(action))?
            .ok_or(CartError::ProductNotFound(request.product_id))?;

        let line = NewCartLine {
            user_id: shopper.user_id(),
            product_id: product.id,
            quantity: request.quantity,
            unit_price: product.price,
            size: request.size,
            color: request.color,
        };

        match shopper {
            Shopper::Guest => {
                let mut cart = self.guest_cart(action).await?;
                cart.push(line);
                self.save_guest_cart(&cart, action).await?;
                Ok(CartSummary::from_lines(cart.into_lines()))
            }
            Shopper::Authenticated(user) => {
                let mut tx = self.store.begin().await.map_err(persistence(action))?;
                self.add_in(&mut tx, user, line, action).await?;
                tx.commit().await.map_err(persistence(action))?;
                self.list(shopper).await
            }
        }
    }

    /// Apply the add policy for one line inside an open transaction.
    async fn add_in(
        &self,
        tx: &mut S::Tx,
        user: UserId,
        line: NewCartLine,
        action: CartAction,
    ) -> Result<(), CartError> {
        let existing = tx
            .find_by_product(user, line.product_id)
            .await
            .map_err(persistence(action))?;

        let Some(existing) = existing else {
            tx.insert_line(&line).await.map_err(persistence(action))?;
            return Ok(());
        };

        let quantity = existing
            .quantity
            .checked_add(line.quantity)
            .filter(|q| *q <= MAX_LINE_QUANTITY)
            .ok_or_else(quantity_overflow)?;
        tx.update_line(existing.id, &LineChanges::quantity(quantity))
            .await
            .map_err(persistence(action))?;

        if self.policy == AddPolicy::Legacy {
            tx.insert_line(&line).await.map_err(persistence(action))?;
        }
        Ok(())
    }

    /// Replace quantity, sizes and colors of a line, writing only the fields
    /// that differ.
    ///
    /// `id` is the product id for signed-in shoppers and the line key for
    /// guests.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if there is no such line and
    /// `CartError::Persistence`/`Session` if the write fails.
    #[instrument(skip(self, request), fields(quantity = request.quantity))]
    pub async fn update(
        &self,
        shopper: Shopper,
        id: i32,
        request: UpdateLine,
    ) -> Result<UpdateOutcome, CartError> {
        let action = CartAction::Update;
        match shopper {
            Shopper::Authenticated(user) => {
                let mut tx = self.store.begin().await.map_err(persistence(action))?;
                let line = tx
                    .find_by_product(user, ProductId::new(id))
                    .await
                    .map_err(persistence(action))?
                    .ok_or(CartError::LineNotFound)?;

                let changes = LineChanges::between(
                    &line,
                    Some(request.quantity),
                    Some(&request.size),
                    Some(&request.color),
                );
                self.write_changes(tx, shopper, line.id, &changes, action).await
            }
            Shopper::Guest => {
                let key = CartLineId::new(id);
                let mut cart = self.guest_cart(action).await?;
                let line = cart.get(key).ok_or(CartError::LineNotFound)?;
                let changes = LineChanges::between(
                    line,
                    Some(request.quantity),
                    Some(&request.size),
                    Some(&request.color),
                );
                self.write_guest_changes(&mut cart, key, &changes, action).await
            }
        }
    }

    /// Set the quantity of a line, by line id for signed-in shoppers and line
    /// key for guests.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if there is no such line and
    /// `CartError::Persistence`/`Session` if the write fails.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        shopper: Shopper,
        id: CartLineId,
        quantity: u32,
    ) -> Result<UpdateOutcome, CartError> {
        let action = CartAction::Update;
        match shopper {
            Shopper::Authenticated(user) => {
                let mut tx = self.store.begin().await.map_err(persistence(action))?;
                let line = tx
                    .find_by_id(user, id)
                    .await
                    .map_err(persistence(action))?
                    .ok_or(CartError::LineNotFound)?;

                let changes = LineChanges::between(&line, Some(quantity), None, None);
                self.write_changes(tx, shopper, line.id, &changes, action).await
            }
            Shopper::Guest => {
                let mut cart = self.guest_cart(action).await?;
                let line = cart.get(id).ok_or(CartError::LineNotFound)?;
                let changes = LineChanges::between(line, Some(quantity), None, None);
                self.write_guest_changes(&mut cart, id, &changes, action).await
            }
        }
    }

    async fn write_changes(
        &self,
        mut tx: S::Tx,
        shopper: Shopper,
        id: CartLineId,
        changes: &LineChanges,
        action: CartAction,
    ) -> Result<UpdateOutcome, CartError> {
        if changes.is_empty() {
            return Ok(UpdateOutcome::NoChange);
        }
        tx.update_line(id, changes)
            .await
            .map_err(persistence(action))?;
        tx.commit().await.map_err(persistence(action))?;
        Ok(UpdateOutcome::Updated(self.list(shopper).await?))
    }

    async fn write_guest_changes(
        &self,
        cart: &mut GuestCart,
        key: CartLineId,
        changes: &LineChanges,
        action: CartAction,
    ) -> Result<UpdateOutcome, CartError> {
        if changes.is_empty() {
            return Ok(UpdateOutcome::NoChange);
        }
        cart.apply(key, changes);
        self.save_guest_cart(cart, action).await?;
        Ok(UpdateOutcome::Updated(CartSummary::from_lines(
            cart.lines().to_vec(),
        )))
    }

    /// Remove a line. Removing a line that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence`/`Session` if the write fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, shopper: Shopper, id: CartLineId) -> Result<CartSummary, CartError> {
        let action = CartAction::Remove;
        match shopper {
            Shopper::Authenticated(user) => {
                let mut tx = self.store.begin().await.map_err(persistence(action))?;
                let removed = tx
                    .delete_line(user, id)
                    .await
                    .map_err(persistence(action))?;
                tx.commit().await.map_err(persistence(action))?;
                if !removed {
                    info!(line_id = %id, "Cart line already absent");
                }
                self.list(shopper).await
            }
            Shopper::Guest => {
                let mut cart = self.guest_cart(action).await?;
                if cart.remove(id) {
                    self.save_guest_cart(&cart, action).await?;
                }
                Ok(CartSummary::from_lines(cart.into_lines()))
            }
        }
    }

    /// Remove every line. All or nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence`/`Session` if the delete fails, in
    /// which case no line was removed.
    #[instrument(skip(self))]
    pub async fn clear(&self, shopper: Shopper) -> Result<(), CartError> {
        let action = CartAction::Clear;
        match shopper {
            Shopper::Authenticated(user) => {
                let mut tx = self.store.begin().await.map_err(persistence(action))?;
                let removed = tx.delete_all(user).await.map_err(persistence(action))?;
                tx.commit().await.map_err(persistence(action))?;
                info!(removed, "Cart cleared");
                Ok(())
            }
            Shopper::Guest => self
                .session
                .forget(session_keys::GUEST_CART)
                .await
                .map_err(session_failure(action)),
        }
    }

    /// Whether the cart has a line for the product named by `raw_id`.
    ///
    /// Identifiers that are not numeric yield `false`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence`/`Session` if the cart cannot be read.
    #[instrument(skip(self))]
    pub async fn item_exists(&self, shopper: Shopper, raw_id: &str) -> Result<bool, CartError> {
        let Ok(product) = raw_id.parse::<ProductId>() else {
            return Ok(false);
        };
        match shopper {
            Shopper::Authenticated(user) => self
                .store
                .has_product(user, product)
                .await
                .map_err(persistence(CartAction::Lookup)),
            Shopper::Guest => Ok(self
                .guest_cart(CartAction::Lookup)
                .await?
                .contains_product(product)),
        }
    }

    /// Number of lines in the cart (not a quantity or money sum).
    ///
    /// # Errors
    ///
    /// Returns `CartError::Persistence`/`Session` if the cart cannot be read.
    #[instrument(skip(self))]
    pub async fn line_count(&self, shopper: Shopper) -> Result<u64, CartError> {
        match shopper {
            Shopper::Authenticated(user) => self
                .store
                .count_lines(user)
                .await
                .map_err(persistence(CartAction::Count)),
            Shopper::Guest => Ok(self.guest_cart(CartAction::Count).await?.len() as u64),
        }
    }

    /// The shopper's lines for `product`. Guests get their whole cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Empty` if there is nothing to return and
    /// `CartError::Persistence`/`Session` if the cart cannot be read.
    #[instrument(skip(self))]
    pub async fn lines_for_product(
        &self,
        shopper: Shopper,
        product: ProductId,
    ) -> Result<Vec<CartLine>, CartError> {
        let lines = match shopper {
            Shopper::Authenticated(user) => self
                .store
                .lines_for_product(user, product)
                .await
                .map_err(persistence(CartAction::Lookup))?,
            Shopper::Guest => self.guest_cart(CartAction::Lookup).await?.into_lines(),
        };
        if lines.is_empty() {
            return Err(CartError::Empty);
        }
        Ok(lines)
    }

    /// Move the session cart into `user`'s persistent cart after sign-in.
    ///
    /// Every guest line goes through the add path under the active policy,
    /// keeping the price it was added at. Lines whose product no longer exists
    /// are dropped. The session cart is forgotten only once the transaction
    /// has committed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` if a merged quantity would overflow and
    /// `CartError::Persistence`/`Session` on storage failure. On error the
    /// persistent cart is unchanged and the session cart is kept.
    #[instrument(skip(self))]
    pub async fn adopt_guest_cart(&self, user: UserId) -> Result<CartSummary, CartError> {
        let action = CartAction::Adopt;
        let shopper = Shopper::Authenticated(user);
        let guest = self.guest_cart(action).await?;
        if guest.is_empty() {
            return self.list(shopper).await;
        }

        let mut adoptable = Vec::with_capacity(guest.len());
        for line in guest.into_lines() {
            let product = self
                .store
                .find_product(line.product_id)
                .await
                .map_err(persistence(action))?;
            if product.is_none() {
                warn!(product_id = %line.product_id, "Dropping guest line for missing product");
                continue;
            }
            adoptable.push(NewCartLine {
                user_id: Some(user),
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                size: line.size,
                color: line.color,
            });
        }

        let adopted = adoptable.len();
        let mut tx = self.store.begin().await.map_err(persistence(action))?;
        for line in adoptable {
            self.add_in(&mut tx, user, line, action).await?;
        }
        tx.commit().await.map_err(persistence(action))?;

        self.session
            .forget(session_keys::GUEST_CART)
            .await
            .map_err(session_failure(action))?;
        info!(adopted, "Guest cart adopted");

        self.list(shopper).await
    }

    async fn guest_cart(&self, action: CartAction) -> Result<GuestCart, CartError> {
        Ok(self
            .session
            .get::<GuestCart>(session_keys::GUEST_CART)
            .await
            .map_err(session_failure(action))?
            .unwrap_or_default())
    }

    async fn save_guest_cart(&self, cart: &GuestCart, action: CartAction) -> Result<(), CartError> {
        self.session
            .put(session_keys::GUEST_CART, cart)
            .await
            .map_err(session_failure(action))
    }
}
