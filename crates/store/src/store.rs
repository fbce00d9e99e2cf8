//! Capability traits over the persistence backends.
//!
//! The services are generic over these traits, so any engine (Postgres,
//! in-memory for tests) can back them without touching the business logic.

use async_trait::async_trait;
use common::{AddressId, CartId, OrderId, ProductId, UserId};

use crate::model::{Address, Cart, Order, Product};
use crate::Result;

/// Product stock: reads for validation and price snapshots, plus the
/// compare-and-swap decrement used at checkout commit.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Persists a new product.
    async fn create_product(&self, product: &Product) -> Result<()>;

    /// Loads a product by id.
    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Lists the catalog.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Returns true iff the product exists, has stock, and has at least
    /// `quantity` units.
    async fn check_available(&self, product_id: ProductId, quantity: u32) -> Result<bool>;

    /// Atomically subtracts `quantity` units of stock.
    ///
    /// Fails with [`crate::StoreError::InsufficientStock`] when fewer units
    /// remain; the check and the write are one operation, so two racing
    /// callers cannot both succeed on the last unit.
    async fn decrement_stock(&self, product_id: ProductId, quantity: u32) -> Result<()>;
}

/// The user-to-cart mapping. Every user has at most one cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the user's cart, creating an empty one exactly once under
    /// concurrent first access.
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart>;

    /// Returns the user's cart if one exists.
    async fn find_cart(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Persists the cart's lines and total in one transaction, guarded by
    /// the cart's version. Returns the cart at its new version; fails with
    /// [`crate::StoreError::VersionConflict`] if the stored version moved.
    async fn save_cart(&self, cart: &Cart) -> Result<Cart>;

    /// Removes all lines and zeroes the total. A no-op on an already-empty
    /// cart.
    async fn clear_cart(&self, cart_id: CartId) -> Result<()>;
}

/// Delivery addresses, scoped to their owning user.
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn create_address(&self, address: &Address) -> Result<()>;

    /// Loads an address only if it belongs to the given user.
    async fn find_address(&self, address_id: AddressId, user_id: UserId)
        -> Result<Option<Address>>;

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>>;

    /// Deletes the address if it belongs to the user. Returns whether a row
    /// was removed.
    async fn delete_address(&self, address_id: AddressId, user_id: UserId) -> Result<bool>;
}

/// Read access to persisted orders. Orders are written only through
/// [`CheckoutStore::commit_order`] and are immutable afterwards.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>>;
}

/// The composite capability checkout needs: everything above plus the one
/// atomic commit.
#[async_trait]
pub trait CheckoutStore: CartStore + OrderStore + InventoryLedger + AddressStore {
    /// Persists the order with its items and payment, decrements stock for
    /// every item, and clears the cart — all in one transaction.
    ///
    /// Each decrement re-checks availability (compare-and-swap); on any
    /// failure nothing is committed: no order, no payment, no stock change,
    /// cart untouched.
    async fn commit_order(&self, order: &Order, cart_id: CartId) -> Result<()>;
}
