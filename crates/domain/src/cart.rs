//! The cart mutation state machine.
//!
//! Every operation loads the cart, applies one mutation, re-establishes the
//! total-price invariant and saves in a single version-guarded write. Prices
//! are snapshotted from the catalog at add time and refreshed on quantity
//! adjustment; checkout later commits the snapshots, never the live price.

use common::{ProductId, UserId};
use store::{Cart, CartLine, CartStore, InventoryLedger, Product};

use crate::error::DomainError;

/// A single-step quantity adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Increment,
    Decrement,
}

/// Service for reading and mutating a user's cart.
pub struct CartService<S> {
    store: S,
}

impl<S: CartStore + InventoryLedger> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart, DomainError> {
        self.store
            .find_cart(user_id)
            .await?
            .ok_or(DomainError::NoActiveCart { user_id })
    }

    /// Adds a product to the cart, creating the cart on first use.
    ///
    /// Snapshots the product's effective price and discount into the new
    /// line. Stock is validated but not decremented; depletion happens at
    /// checkout.
    #[tracing::instrument(skip(self))]
    pub async fn add_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, DomainError> {
        let mut cart = self.store.get_or_create_cart(user_id).await?;
        let product = self.find_product(product_id).await?;

        if cart.line(product_id).is_some() {
            return Err(DomainError::DuplicateItem {
                product_name: product.name,
            });
        }
        if product.quantity == 0 {
            return Err(DomainError::OutOfStock {
                product_name: product.name,
            });
        }
        if product.quantity < quantity {
            return Err(DomainError::InsufficientStock {
                product_name: product.name,
                available: product.quantity,
                requested: quantity,
            });
        }

        cart.add_line(CartLine {
            product_id,
            product_name: product.name,
            quantity,
            unit_price: product.special_price,
            discount: product.discount,
        });

        debug_assert_eq!(cart.total_price, cart.computed_total());
        Ok(self.store.save_cart(&cart).await?)
    }

    /// Adjusts a line's quantity by one step.
    ///
    /// Refreshes the line's unit price from the live catalog price (folding
    /// any drift back into the total), recomputes the line discount for the
    /// new quantity, and removes the line entirely when it reaches zero.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        change: QuantityChange,
    ) -> Result<Cart, DomainError> {
        let mut cart = self
            .store
            .find_cart(user_id)
            .await?
            .ok_or(DomainError::NoActiveCart { user_id })?;
        let product = self.find_product(product_id).await?;

        if product.quantity == 0 {
            return Err(DomainError::OutOfStock {
                product_name: product.name,
            });
        }

        let Some(line) = cart.line(product_id) else {
            return Err(DomainError::ItemNotInCart {
                product: product.name,
            });
        };
        if change == QuantityChange::Decrement && line.quantity == 0 {
            return Err(DomainError::AlreadyZero {
                product_name: product.name,
            });
        }

        let old_price = line.unit_price;
        let old_quantity = line.quantity;
        let new_price = product.special_price;
        let new_quantity = match change {
            QuantityChange::Increment => old_quantity + 1,
            QuantityChange::Decrement => old_quantity - 1,
        };

        // Fold the snapshot's price drift into the total before applying
        // the delta, so the total stays equal to the sum of line totals.
        if new_price != old_price {
            cart.total_price += (new_price - old_price).times(old_quantity);
        }

        if let Some(line) = cart.line_mut(product_id) {
            line.unit_price = new_price;
            line.quantity = new_quantity;
            line.discount = product.discount.times(new_quantity);
        }
        match change {
            QuantityChange::Increment => cart.total_price += new_price,
            QuantityChange::Decrement => cart.total_price -= new_price,
        }

        if new_quantity == 0 {
            cart.remove_line(product_id);
        }

        debug_assert_eq!(cart.total_price, cart.computed_total());
        Ok(self.store.save_cart(&cart).await?)
    }

    /// Removes a product's line from the cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_product(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, DomainError> {
        let mut cart = self
            .store
            .find_cart(user_id)
            .await?
            .ok_or(DomainError::NoActiveCart { user_id })?;

        if cart.remove_line(product_id).is_none() {
            return Err(DomainError::ItemNotInCart {
                product: product_id.to_string(),
            });
        }

        debug_assert_eq!(cart.total_price, cart.computed_total());
        Ok(self.store.save_cart(&cart).await?)
    }

    async fn find_product(&self, product_id: ProductId) -> Result<Product, DomainError> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound { product_id })
    }
}
