use common::{CartId, ProductId};
use thiserror::Error;

/// Errors produced by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A cart save raced with another mutation of the same cart.
    #[error("cart {cart_id} was modified concurrently (expected version {expected})")]
    VersionConflict { cart_id: CartId, expected: i64 },

    /// A stock decrement found fewer units than requested. Raised by the
    /// commit-time compare-and-swap, so racing checkouts serialize.
    #[error(
        "insufficient stock for product {product_id}: {available} available, {requested} requested"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
