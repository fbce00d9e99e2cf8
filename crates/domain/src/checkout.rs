//! Checkout: the atomic conversion of a cart into an order.

use std::time::Instant;

use chrono::Utc;
use common::{AddressId, OrderId, PaymentId, UserId};
use store::{
    AddressStore, CartStore, CheckoutStore, InventoryLedger, Order, OrderItem, OrderStatus,
    OrderStore, Payment, StoreError,
};

use crate::error::DomainError;

/// Everything the caller supplies to place an order. The gateway fields are
/// stored verbatim; the core does not interpret them.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub address_id: AddressId,
    pub payment_method: String,
    pub pg_name: String,
    pub pg_payment_id: String,
    pub pg_status: String,
    pub pg_message: String,
}

/// Orchestrates `place_order` and serves order reads.
pub struct CheckoutService<S> {
    store: S,
}

impl<S: CheckoutStore> CheckoutService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts the user's cart into an order.
    ///
    /// Validates the cart, the address and current stock, assembles the
    /// order from the cart's price snapshots, then hands the writes (order,
    /// items, payment, stock decrements, cart clearing) to the store's
    /// single atomic commit. A failure at any point leaves every entity
    /// untouched.
    #[tracing::instrument(skip(self, request), fields(address_id = %request.address_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: PlaceOrder,
    ) -> Result<Order, DomainError> {
        let started = Instant::now();
        let result = self.place_order_inner(user_id, request).await;
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(order_id = %order.id, total = %order.total_amount, "order placed");
            }
            Err(err) => {
                metrics::counter!("checkout_failures_total").increment(1);
                tracing::warn!(error = %err, "checkout failed");
            }
        }

        result
    }

    async fn place_order_inner(
        &self,
        user_id: UserId,
        request: PlaceOrder,
    ) -> Result<Order, DomainError> {
        let cart = self
            .store
            .find_cart(user_id)
            .await?
            .ok_or(DomainError::NoActiveCart { user_id })?;
        if cart.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let address = self
            .store
            .find_address(request.address_id, user_id)
            .await?
            .ok_or(DomainError::AddressNotFound {
                address_id: request.address_id,
            })?;

        // Re-validate each line; stock may have moved since the cart
        // mutation checks.
        for line in &cart.lines {
            let product = self
                .store
                .find_product(line.product_id)
                .await?
                .ok_or(DomainError::ProductNotFound {
                    product_id: line.product_id,
                })?;
            if !self
                .store
                .check_available(line.product_id, line.quantity)
                .await?
            {
                return Err(DomainError::InsufficientStock {
                    product_name: product.name,
                    available: product.quantity,
                    requested: line.quantity,
                });
            }
        }

        let order = Order {
            id: OrderId::new(),
            user_id,
            address,
            items: cart
                .lines
                .iter()
                .map(|line| OrderItem {
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                    discount: line.discount,
                    // The cart's snapshot price, not the live catalog price.
                    ordered_price: line.unit_price,
                })
                .collect(),
            payment: Payment {
                id: PaymentId::new(),
                method: request.payment_method,
                pg_name: request.pg_name,
                pg_payment_id: request.pg_payment_id,
                pg_status: request.pg_status,
                pg_message: request.pg_message,
            },
            total_amount: cart.total_price,
            status: OrderStatus::Accepted,
            created_at: Utc::now(),
        };

        match self.store.commit_order(&order, cart.id).await {
            Ok(()) => Ok(order),
            // The commit-time compare-and-swap lost a race; surface it as
            // the same business failure the pre-check produces.
            Err(StoreError::InsufficientStock {
                product_id,
                available,
                requested,
            }) => Err(DomainError::InsufficientStock {
                product_name: cart
                    .line(product_id)
                    .map(|l| l.product_name.clone())
                    .unwrap_or_else(|| product_id.to_string()),
                available,
                requested,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Loads an order by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .find_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound { order_id })
    }

    /// Lists the user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders(user_id).await?)
    }
}
