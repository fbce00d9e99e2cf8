//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{AddressId, CartId, Money, OrderId, PaymentId, UserId};
use sqlx::PgPool;
use store::{
    Address, AddressStore, Cart, CartLine, CartStore, CheckoutStore, InventoryLedger, Order,
    OrderItem, OrderStatus, OrderStore, Payment, PostgresStore, Product, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for the schema
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_commerce_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE products, carts, cart_items, addresses, orders, order_items, payments CASCADE",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresStore::new(pool)
}

fn widget(quantity: u32, price_cents: i64) -> Product {
    Product::new(
        "Widget",
        "A widget",
        quantity,
        Money::from_cents(price_cents),
        Money::zero(),
    )
}

fn line_for(product: &Product, quantity: u32) -> CartLine {
    CartLine {
        product_id: product.id,
        product_name: product.name.clone(),
        quantity,
        unit_price: product.special_price,
        discount: product.discount,
    }
}

fn address_for(user_id: UserId) -> Address {
    Address {
        id: AddressId::new(),
        user_id,
        street: "1 Main St".to_string(),
        building_name: String::new(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        country: "USA".to_string(),
        zip_code: "62701".to_string(),
    }
}

fn order_for(user_id: UserId, address: Address, items: Vec<OrderItem>, total_cents: i64) -> Order {
    Order {
        id: OrderId::new(),
        user_id,
        address,
        items,
        payment: Payment {
            id: PaymentId::new(),
            method: "card".to_string(),
            pg_name: "stripe".to_string(),
            pg_payment_id: "pay_123".to_string(),
            pg_status: "succeeded".to_string(),
            pg_message: "approved".to_string(),
        },
        total_amount: Money::from_cents(total_cents),
        status: OrderStatus::Accepted,
        created_at: chrono::Utc::now(),
    }
}

fn item_for(product: &Product, quantity: u32) -> OrderItem {
    OrderItem {
        product_id: product.id,
        product_name: product.name.clone(),
        quantity,
        discount: product.discount,
        ordered_price: product.special_price,
    }
}

#[tokio::test]
async fn product_round_trip() {
    let store = get_test_store().await;
    let product = Product::new(
        "Widget",
        "A widget",
        5,
        Money::from_cents(1200),
        Money::from_cents(200),
    );

    store.create_product(&product).await.unwrap();

    let loaded = store.find_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded, product);
    assert_eq!(loaded.special_price, Money::from_cents(1000));

    let all = store.list_products().await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn get_or_create_cart_returns_the_same_cart() {
    let store = get_test_store().await;
    let user_id = UserId::new();

    let first = store.get_or_create_cart(user_id).await.unwrap();
    let second = store.get_or_create_cart(user_id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(first.is_empty());
    assert_eq!(first.total_price, Money::zero());
}

#[tokio::test]
async fn save_cart_round_trips_lines_and_total() {
    let store = get_test_store().await;
    let product = widget(10, 1000);
    store.create_product(&product).await.unwrap();

    let user_id = UserId::new();
    let mut cart = store.get_or_create_cart(user_id).await.unwrap();
    cart.add_line(line_for(&product, 3));

    let saved = store.save_cart(&cart).await.unwrap();
    assert_eq!(saved.version, cart.version + 1);

    let loaded = store.find_cart(user_id).await.unwrap().unwrap();
    assert_eq!(loaded.lines.len(), 1);
    assert_eq!(loaded.lines[0].quantity, 3);
    assert_eq!(loaded.total_price, Money::from_cents(3000));
    assert_eq!(loaded.version, saved.version);
}

#[tokio::test]
async fn save_cart_detects_version_conflicts() {
    let store = get_test_store().await;
    let user_id = UserId::new();
    let cart = store.get_or_create_cart(user_id).await.unwrap();

    store.save_cart(&cart).await.unwrap();

    // Saving the stale snapshot again must conflict.
    let result = store.save_cart(&cart).await;
    assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
}

#[tokio::test]
async fn decrement_stock_is_a_compare_and_swap() {
    let store = get_test_store().await;
    let product = widget(3, 1000);
    store.create_product(&product).await.unwrap();

    store.decrement_stock(product.id, 2).await.unwrap();

    let result = store.decrement_stock(product.id, 2).await;
    assert!(matches!(
        result,
        Err(StoreError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        })
    ));

    // The failed decrement left the row untouched.
    let loaded = store.find_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded.quantity, 1);
}

#[tokio::test]
async fn decrement_unknown_product_reports_zero_available() {
    let store = get_test_store().await;

    let result = store.decrement_stock(common::ProductId::new(), 1).await;
    assert!(matches!(
        result,
        Err(StoreError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        })
    ));
}

#[tokio::test]
async fn check_available_requires_positive_stock() {
    let store = get_test_store().await;
    let stocked = widget(5, 1000);
    let depleted = Product::new("Gadget", "A gadget", 0, Money::from_cents(500), Money::zero());
    store.create_product(&stocked).await.unwrap();
    store.create_product(&depleted).await.unwrap();

    assert!(store.check_available(stocked.id, 5).await.unwrap());
    assert!(!store.check_available(stocked.id, 6).await.unwrap());
    assert!(!store.check_available(depleted.id, 1).await.unwrap());
    assert!(!store.check_available(common::ProductId::new(), 1).await.unwrap());
}

#[tokio::test]
async fn clear_cart_empties_lines_and_is_idempotent() {
    let store = get_test_store().await;
    let product = widget(10, 1000);
    store.create_product(&product).await.unwrap();

    let user_id = UserId::new();
    let mut cart = store.get_or_create_cart(user_id).await.unwrap();
    cart.add_line(line_for(&product, 2));
    let cart = store.save_cart(&cart).await.unwrap();

    store.clear_cart(cart.id).await.unwrap();
    store.clear_cart(cart.id).await.unwrap();

    let loaded = store.find_cart(user_id).await.unwrap().unwrap();
    assert!(loaded.is_empty());
    assert_eq!(loaded.total_price, Money::zero());
}

#[tokio::test]
async fn clear_unknown_cart_is_a_no_op() {
    let store = get_test_store().await;
    store.clear_cart(CartId::new()).await.unwrap();
}

#[tokio::test]
async fn addresses_are_scoped_to_their_owner() {
    let store = get_test_store().await;
    let owner = UserId::new();
    let stranger = UserId::new();
    let address = address_for(owner);

    store.create_address(&address).await.unwrap();

    assert_eq!(
        store.find_address(address.id, owner).await.unwrap(),
        Some(address.clone())
    );
    assert_eq!(store.find_address(address.id, stranger).await.unwrap(), None);

    assert_eq!(store.list_addresses(owner).await.unwrap().len(), 1);
    assert!(store.list_addresses(stranger).await.unwrap().is_empty());

    assert!(!store.delete_address(address.id, stranger).await.unwrap());
    assert!(store.delete_address(address.id, owner).await.unwrap());
    assert!(store.list_addresses(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn commit_order_persists_decrements_and_clears_atomically() {
    let store = get_test_store().await;
    let p1 = widget(5, 1000);
    let p2 = Product::new("Gadget", "A gadget", 3, Money::from_cents(500), Money::zero());
    store.create_product(&p1).await.unwrap();
    store.create_product(&p2).await.unwrap();

    let user_id = UserId::new();
    let mut cart = store.get_or_create_cart(user_id).await.unwrap();
    cart.add_line(line_for(&p1, 2));
    cart.add_line(line_for(&p2, 1));
    let cart = store.save_cart(&cart).await.unwrap();

    let order = order_for(
        user_id,
        address_for(user_id),
        vec![item_for(&p1, 2), item_for(&p2, 1)],
        2500,
    );

    store.commit_order(&order, cart.id).await.unwrap();

    // Order, items and payment are all readable back.
    let loaded = store.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(loaded.total_amount, Money::from_cents(2500));
    assert_eq!(loaded.items.len(), 2);
    assert_eq!(loaded.payment.pg_payment_id, "pay_123");
    assert_eq!(loaded.address.street, "1 Main St");
    assert_eq!(loaded.status, OrderStatus::Accepted);

    // Stock decremented by exactly the ordered quantities.
    assert_eq!(store.find_product(p1.id).await.unwrap().unwrap().quantity, 3);
    assert_eq!(store.find_product(p2.id).await.unwrap().unwrap().quantity, 2);

    // Cart emptied but retained.
    let loaded_cart = store.find_cart(user_id).await.unwrap().unwrap();
    assert_eq!(loaded_cart.id, cart.id);
    assert!(loaded_cart.is_empty());
    assert_eq!(loaded_cart.total_price, Money::zero());

    let listed = store.list_orders(user_id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn commit_order_rolls_back_everything_on_insufficient_stock() {
    let store = get_test_store().await;
    let p1 = widget(5, 1000);
    let p2 = Product::new("Gadget", "A gadget", 0, Money::from_cents(500), Money::zero());
    store.create_product(&p1).await.unwrap();
    store.create_product(&p2).await.unwrap();

    let user_id = UserId::new();
    let mut cart = store.get_or_create_cart(user_id).await.unwrap();
    cart.add_line(line_for(&p1, 2));
    let cart = store.save_cart(&cart).await.unwrap();

    let order = order_for(
        user_id,
        address_for(user_id),
        vec![item_for(&p1, 2), item_for(&p2, 1)],
        2500,
    );

    let result = store.commit_order(&order, cart.id).await;
    assert!(matches!(
        result,
        Err(StoreError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        })
    ));

    // The p1 decrement ran inside the transaction and was rolled back.
    assert_eq!(store.find_product(p1.id).await.unwrap().unwrap().quantity, 5);

    // No order, no payment, cart untouched.
    assert_eq!(store.find_order(order.id).await.unwrap(), None);
    assert!(store.list_orders(user_id).await.unwrap().is_empty());
    let loaded_cart = store.find_cart(user_id).await.unwrap().unwrap();
    assert_eq!(loaded_cart.lines.len(), 1);
    assert_eq!(loaded_cart.total_price, Money::from_cents(2000));
}

#[tokio::test]
async fn racing_decrements_cannot_both_take_the_last_unit() {
    let store = get_test_store().await;
    let product = widget(1, 1000);
    store.create_product(&product).await.unwrap();

    let (a, b) = tokio::join!(
        store.decrement_stock(product.id, 1),
        store.decrement_stock(product.id, 1),
    );

    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(store.find_product(product.id).await.unwrap().unwrap().quantity, 0);
}
