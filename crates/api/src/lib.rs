//! HTTP API server for the commerce backend.
//!
//! Exposes catalog browsing, cart management, address management and the
//! cart-to-order checkout over REST, with structured logging (tracing) and
//! Prometheus metrics. Handlers are generic over the store backend.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{AddressService, CartService, CatalogService, CheckoutService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::CheckoutStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CheckoutStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/products", post(routes::products::create::<S>))
        .route("/api/products", get(routes::products::list::<S>))
        .route("/api/products/{id}", get(routes::products::get::<S>))
        .route(
            "/api/carts/products/{product_id}/quantity/{quantity}",
            post(routes::cart::add_product::<S>),
        )
        .route("/api/carts/users/cart", get(routes::cart::get_cart::<S>))
        .route(
            "/api/cart/products/{product_id}/quantity/{operation}",
            put(routes::cart::update_quantity::<S>),
        )
        .route(
            "/api/carts/product/{product_id}",
            delete(routes::cart::remove_product::<S>),
        )
        .route("/api/addresses", post(routes::addresses::create::<S>))
        .route("/api/addresses", get(routes::addresses::list::<S>))
        .route("/api/addresses/{id}", get(routes::addresses::get::<S>))
        .route("/api/addresses/{id}", delete(routes::addresses::remove::<S>))
        .route("/api/users/order", post(routes::orders::place::<S>))
        .route("/api/users/orders", get(routes::orders::list::<S>))
        .route("/api/orders/{id}", get(routes::orders::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state by wiring every service to the given store.
pub fn create_state<S: CheckoutStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        carts: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone()),
        catalog: CatalogService::new(store.clone()),
        addresses: AddressService::new(store),
    })
}
