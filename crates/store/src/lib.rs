pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{Address, Cart, CartLine, Order, OrderItem, OrderStatus, Payment, Product};
pub use postgres::PostgresStore;
pub use store::{AddressStore, CartStore, CheckoutStore, InventoryLedger, OrderStore};
