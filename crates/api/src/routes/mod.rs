pub mod addresses;
pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use domain::{AddressService, CartService, CatalogService, CheckoutService};
use store::CheckoutStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CheckoutStore> {
    pub carts: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub catalog: CatalogService<S>,
    pub addresses: AddressService<S>,
}
