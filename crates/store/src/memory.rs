//! In-memory store for tests and local development.
//!
//! A single `RwLock` stands in for the database's transaction isolation:
//! every mutation happens under one write guard, and `commit_order`
//! validates every decrement before applying anything, so a failed checkout
//! leaves no partial state behind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{AddressId, CartId, OrderId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::model::{Address, Cart, Order, Product};
use crate::store::{AddressStore, CartStore, CheckoutStore, InventoryLedger, OrderStore};
use crate::{Result, StoreError};

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    addresses: HashMap<AddressId, Address>,
    orders: HashMap<OrderId, Order>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl InventoryLedger for InMemoryStore {
    async fn create_product(&self, product: &Product) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner.products.get(&product_id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<_> = inner.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn check_available(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .get(&product_id)
            .is_some_and(|p| p.quantity > 0 && p.quantity >= quantity))
    }

    async fn decrement_stock(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut inner = self.inner.write().await;

        let available = inner.products.get(&product_id).map_or(0, |p| p.quantity);
        if available < quantity {
            return Err(StoreError::InsufficientStock {
                product_id,
                available,
                requested: quantity,
            });
        }

        if let Some(product) = inner.products.get_mut(&product_id) {
            product.quantity -= quantity;
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart> {
        let mut inner = self.inner.write().await;
        let cart = inner
            .carts
            .entry(user_id)
            .or_insert_with(|| Cart::new(user_id));
        Ok(cart.clone())
    }

    async fn find_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let inner = self.inner.read().await;
        Ok(inner.carts.get(&user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart> {
        let mut inner = self.inner.write().await;

        if let Some(current) = inner.carts.get(&cart.user_id)
            && current.version != cart.version
        {
            return Err(StoreError::VersionConflict {
                cart_id: cart.id,
                expected: cart.version,
            });
        }

        let mut saved = cart.clone();
        saved.version += 1;
        inner.carts.insert(cart.user_id, saved.clone());
        Ok(saved)
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(cart) = inner.carts.values_mut().find(|c| c.id == cart_id) {
            cart.clear();
            cart.version += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn create_address(&self, address: &Address) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.addresses.insert(address.id, address.clone());
        Ok(())
    }

    async fn find_address(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>> {
        let inner = self.inner.read().await;
        Ok(inner
            .addresses
            .get(&address_id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>> {
        let inner = self.inner.read().await;
        Ok(inner
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_address(&self, address_id: AddressId, user_id: UserId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .addresses
            .get(&address_id)
            .is_some_and(|a| a.user_id == user_id);
        if owned {
            inner.addresses.remove(&address_id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&order_id).cloned())
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<_> = inner
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[async_trait]
impl CheckoutStore for InMemoryStore {
    async fn commit_order(&self, order: &Order, cart_id: CartId) -> Result<()> {
        let mut inner = self.inner.write().await;

        // Validate every decrement before touching anything, so a failure
        // commits nothing.
        for item in &order.items {
            let available = inner.products.get(&item.product_id).map_or(0, |p| p.quantity);
            if available < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id,
                    available,
                    requested: item.quantity,
                });
            }
        }

        for item in &order.items {
            if let Some(product) = inner.products.get_mut(&item.product_id) {
                product.quantity -= item.quantity;
            }
        }

        inner.orders.insert(order.id, order.clone());

        if let Some(cart) = inner.carts.values_mut().find(|c| c.id == cart_id) {
            cart.clear();
            cart.version += 1;
        }

        Ok(())
    }
}
