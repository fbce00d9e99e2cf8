//! Domain error taxonomy.
//!
//! Every variant except `Store` is a business-rule failure: reported
//! synchronously, never retried. Infrastructure failures stay behind the
//! `Store` wrapper so the boundary can tell the two apart.

use common::{AddressId, OrderId, ProductId, UserId};
use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// The user has no cart yet.
    #[error("no active cart exists for user {user_id}")]
    NoActiveCart { user_id: UserId },

    /// Checkout was attempted on a cart with no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The cart already holds a line for this product.
    #[error("product {product_name} already exists in the cart")]
    DuplicateItem { product_name: String },

    /// The cart holds no line for this product.
    #[error("product {product} does not exist in the cart")]
    ItemNotInCart { product: String },

    /// The product has no stock at all.
    #[error("product {product_name} is not available")]
    OutOfStock { product_name: String },

    /// The product has stock, but less than requested.
    #[error("only {available} of {product_name} available, {requested} requested")]
    InsufficientStock {
        product_name: String,
        available: u32,
        requested: u32,
    },

    /// Defensive guard: a decrement was requested on a line already at
    /// quantity zero. Lines are removed when they reach zero, so this is
    /// unreachable through the public operations.
    #[error("quantity of product {product_name} is already zero")]
    AlreadyZero { product_name: String },

    /// No address with this id belongs to the requesting user.
    #[error("address {address_id} does not exist for this user")]
    AddressNotFound { address_id: AddressId },

    /// The product does not exist in the catalog.
    #[error("product {product_id} does not exist")]
    ProductNotFound { product_id: ProductId },

    /// The order does not exist.
    #[error("order {order_id} does not exist")]
    OrderNotFound { order_id: OrderId },

    /// Infrastructure failure from the persistence layer.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
