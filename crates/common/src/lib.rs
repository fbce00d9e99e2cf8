//! Shared types for the commerce backend.

pub mod ids;
pub mod money;

pub use ids::{AddressId, CartId, OrderId, PaymentId, ProductId, UserId};
pub use money::Money;
