//! PostgreSQL-backed store.
//!
//! All queries are runtime-checked `sqlx::query` calls; every multi-row
//! mutation runs inside a transaction. Stock decrements are a single
//! `UPDATE .. WHERE quantity >= $n`, so availability check and write cannot
//! be split by a concurrent writer.

use async_trait::async_trait;
use common::{AddressId, CartId, Money, OrderId, PaymentId, ProductId, UserId};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::model::{Address, Cart, CartLine, Order, OrderItem, OrderStatus, Payment, Product};
use crate::store::{AddressStore, CartStore, CheckoutStore, InventoryLedger, OrderStore};
use crate::{Result, StoreError};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            quantity: row.try_get::<i32, _>("quantity")?.max(0) as u32,
            price: Money::from_cents(row.try_get("price_cents")?),
            discount: Money::from_cents(row.try_get("discount_cents")?),
            special_price: Money::from_cents(row.try_get("special_price_cents")?),
        })
    }

    fn row_to_line(row: &PgRow) -> Result<CartLine> {
        Ok(CartLine {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: row.try_get::<i32, _>("quantity")?.max(0) as u32,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            discount: Money::from_cents(row.try_get("discount_cents")?),
        })
    }

    fn row_to_address(row: &PgRow) -> Result<Address> {
        Ok(Address {
            id: AddressId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            street: row.try_get("street")?,
            building_name: row.try_get("building_name")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            country: row.try_get("country")?,
            zip_code: row.try_get("zip_code")?,
        })
    }

    async fn load_cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, unit_price_cents, discount_cents
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_line).collect()
    }

    async fn load_order(&self, row: &PgRow) -> Result<Order> {
        let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let user_id = UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?);

        let address = Address {
            id: AddressId::from_uuid(row.try_get::<Uuid, _>("address_id")?),
            user_id,
            street: row.try_get("street")?,
            building_name: row.try_get("building_name")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            country: row.try_get("country")?,
            zip_code: row.try_get("zip_code")?,
        };

        let item_rows = sqlx::query(
            r#"
            SELECT product_id, product_name, quantity, discount_cents, ordered_price_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let items = item_rows
            .iter()
            .map(|row| {
                Ok(OrderItem {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    product_name: row.try_get("product_name")?,
                    quantity: row.try_get::<i32, _>("quantity")?.max(0) as u32,
                    discount: Money::from_cents(row.try_get("discount_cents")?),
                    ordered_price: Money::from_cents(row.try_get("ordered_price_cents")?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let payment_row = sqlx::query(
            r#"
            SELECT id, method, pg_name, pg_payment_id, pg_status, pg_message
            FROM payments
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        let payment = Payment {
            id: PaymentId::from_uuid(payment_row.try_get::<Uuid, _>("id")?),
            method: payment_row.try_get("method")?,
            pg_name: payment_row.try_get("pg_name")?,
            pg_payment_id: payment_row.try_get("pg_payment_id")?,
            pg_status: payment_row.try_get("pg_status")?,
            pg_message: payment_row.try_get("pg_message")?,
        };

        let status: String = row.try_get("status")?;

        Ok(Order {
            id: order_id,
            user_id,
            address,
            items,
            payment,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            status: OrderStatus::parse(&status).unwrap_or_default(),
            created_at: row.try_get("created_at")?,
        })
    }

    /// Compare-and-swap stock decrement on an arbitrary connection, so it
    /// can run standalone or inside the checkout transaction.
    async fn decrement_on(
        conn: &mut PgConnection,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE products SET quantity = quantity - $2 WHERE id = $1 AND quantity >= $2",
        )
        .bind(product_id.as_uuid())
        .bind(quantity as i32)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let available: Option<i32> =
                sqlx::query_scalar("SELECT quantity FROM products WHERE id = $1")
                    .bind(product_id.as_uuid())
                    .fetch_optional(&mut *conn)
                    .await?;

            return Err(StoreError::InsufficientStock {
                product_id,
                available: available.unwrap_or(0).max(0) as u32,
                requested: quantity,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl InventoryLedger for PostgresStore {
    async fn create_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, quantity, price_cents, discount_cents, special_price_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.quantity as i32)
        .bind(product.price.cents())
        .bind(product.discount.cents())
        .bind(product.special_price.cents())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, quantity, price_cents, discount_cents, special_price_cents
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, quantity, price_cents, discount_cents, special_price_cents
            FROM products
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }

    async fn check_available(&self, product_id: ProductId, quantity: u32) -> Result<bool> {
        let available: Option<bool> =
            sqlx::query_scalar("SELECT quantity > 0 AND quantity >= $2 FROM products WHERE id = $1")
                .bind(product_id.as_uuid())
                .bind(quantity as i32)
                .fetch_optional(&self.pool)
                .await?;

        Ok(available.unwrap_or(false))
    }

    async fn decrement_stock(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::decrement_on(&mut conn, product_id, quantity).await
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart> {
        // The unique constraint on user_id makes first-access creation
        // exactly-once; the loser of a racing insert falls through to the
        // select below.
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, total_price_cents, version)
            VALUES ($1, $2, 0, 0)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(CartId::new().as_uuid())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?;

        self.find_cart(user_id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn find_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        let row = sqlx::query(
            "SELECT id, user_id, total_price_cents, version FROM carts WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id = CartId::from_uuid(row.try_get::<Uuid, _>("id")?);

        Ok(Some(Cart {
            id,
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            lines: self.load_cart_lines(id).await?,
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            version: row.try_get("version")?,
        }))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE carts
            SET total_price_cents = $2, version = version + 1
            WHERE id = $1 AND version = $3
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.total_price.cents())
        .bind(cart.version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::VersionConflict {
                cart_id: cart.id,
                expected: cart.version,
            });
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for (position, line) in cart.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_items (cart_id, product_id, product_name, quantity, unit_price_cents, discount_cents, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(cart.id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(&line.product_name)
            .bind(line.quantity as i32)
            .bind(line.unit_price.cents())
            .bind(line.discount.cents())
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut saved = cart.clone();
        saved.version += 1;
        Ok(saved)
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE carts SET total_price_cents = 0, version = version + 1 WHERE id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AddressStore for PostgresStore {
    async fn create_address(&self, address: &Address) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO addresses (id, user_id, street, building_name, city, state, country, zip_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(address.id.as_uuid())
        .bind(address.user_id.as_uuid())
        .bind(&address.street)
        .bind(&address.building_name)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.zip_code)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_address(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, street, building_name, city, state, country, zip_code
            FROM addresses
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(address_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_address).transpose()
    }

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, street, building_name, city, state, country, zip_code
            FROM addresses
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_address).collect()
    }

    async fn delete_address(&self, address_id: AddressId, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(address_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_amount_cents, status, created_at,
                   address_id, street, building_name, city, state, country, zip_code
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_order(&row).await?)),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total_amount_cents, status, created_at,
                   address_id, street, building_name, city, state, country, zip_code
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(self.load_order(row).await?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl CheckoutStore for PostgresStore {
    async fn commit_order(&self, order: &Order, cart_id: CartId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_amount_cents, status, created_at,
                                address_id, street, building_name, city, state, country, zip_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.address.id.as_uuid())
        .bind(&order.address.street)
        .bind(&order.address.building_name)
        .bind(&order.address.city)
        .bind(&order.address.state)
        .bind(&order.address.country)
        .bind(&order.address.zip_code)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, product_name, quantity, discount_cents, ordered_price_cents, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(item.quantity as i32)
            .bind(item.discount.cents())
            .bind(item.ordered_price.cents())
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, method, pg_name, pg_payment_id, pg_status, pg_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.payment.id.as_uuid())
        .bind(order.id.as_uuid())
        .bind(&order.payment.method)
        .bind(&order.payment.pg_name)
        .bind(&order.payment.pg_payment_id)
        .bind(&order.payment.pg_status)
        .bind(&order.payment.pg_message)
        .execute(&mut *tx)
        .await?;

        // Commit-time re-check: a decrement that finds too little stock
        // aborts the whole transaction, rolling back the rows above.
        for item in &order.items {
            Self::decrement_on(&mut tx, item.product_id, item.quantity).await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE carts SET total_price_cents = 0, version = version + 1 WHERE id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(order_id = %order.id, cart_id = %cart_id, "order committed");
        Ok(())
    }
}
