//! Persisted entities.
//!
//! Carts are mutable and versioned; orders are write-once snapshots.
//! Products are referenced (never copied) by cart lines and order items —
//! price fields are snapshotted into the referencing row instead.

use chrono::{DateTime, Utc};
use common::{AddressId, CartId, Money, OrderId, PaymentId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A catalog product with its available stock.
///
/// Stock is only reduced at checkout commit; adding a product to a cart
/// leaves it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Units currently available for sale.
    pub quantity: u32,
    /// List price per unit.
    pub price: Money,
    /// Absolute per-unit markdown.
    pub discount: Money,
    /// Effective unit price, `price - discount`.
    pub special_price: Money,
}

impl Product {
    /// Creates a product, deriving the effective unit price from the list
    /// price and markdown.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        quantity: u32,
        price: Money,
        discount: Money,
    ) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            description: description.into(),
            quantity,
            price,
            discount,
            special_price: price - discount,
        }
    }

    /// Returns true if at least one unit is available.
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// One product entry in a cart.
///
/// `unit_price` and `discount` are snapshots taken when the line was added
/// (refreshed on quantity adjustment, never at checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub discount: Money,
}

impl CartLine {
    /// The line's contribution to the cart total.
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A user's shopping cart. At most one exists per user; it is emptied on
/// checkout and reused, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    /// Running total, kept equal to the sum of line totals by every mutation.
    pub total_price: Money,
    /// Bumped on every save; guards concurrent read-modify-write cycles.
    pub version: i64,
}

impl Cart {
    /// Creates an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            lines: Vec::new(),
            total_price: Money::zero(),
            version: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the line for a product, if present. A cart holds at most one
    /// line per product.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }

    /// Appends a line and folds its total into the cart total.
    pub fn add_line(&mut self, line: CartLine) {
        self.total_price += line.line_total();
        self.lines.push(line);
    }

    /// Removes the line for a product, subtracting its total. Returns the
    /// removed line.
    pub fn remove_line(&mut self, product_id: ProductId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.product_id == product_id)?;
        let line = self.lines.remove(index);
        self.total_price -= line.line_total();
        Some(line)
    }

    /// Removes all lines and zeroes the total. Safe on an empty cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.total_price = Money::zero();
    }

    /// Recomputes the total from the lines. Equal to `total_price` whenever
    /// the cart is consistent.
    pub fn computed_total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

/// A delivery address owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street: String,
    pub building_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

/// Status an order carries from creation on. Orders are created `Accepted`;
/// fulfilment lifecycle is handled outside this system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Accepted,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Accepted => "Accepted",
        }
    }

    /// Parses a persisted status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Accepted" => Some(OrderStatus::Accepted),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frozen copy of a cart line at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub discount: Money,
    pub ordered_price: Money,
}

/// Payment record attached 1:1 to an order. The gateway fields are supplied
/// by the caller and stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub method: String,
    pub pg_name: String,
    pub pg_payment_id: String,
    pub pg_status: String,
    pub pg_message: String,
}

/// An immutable order: address snapshot, frozen items, payment record and
/// the cart total at the moment of checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub address: Address,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
    /// Copied from the cart total; never recomputed.
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: u32, cents: i64) -> CartLine {
        CartLine {
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            quantity,
            unit_price: Money::from_cents(cents),
            discount: Money::zero(),
        }
    }

    #[test]
    fn product_derives_special_price() {
        let product = Product::new(
            "Widget",
            "A widget",
            5,
            Money::from_cents(1200),
            Money::from_cents(200),
        );
        assert_eq!(product.special_price, Money::from_cents(1000));
        assert!(product.in_stock());
    }

    #[test]
    fn empty_cart_has_zero_total() {
        let cart = Cart::new(UserId::new());
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Money::zero());
        assert_eq!(cart.computed_total(), Money::zero());
    }

    #[test]
    fn add_and_remove_line_keep_total_consistent() {
        let mut cart = Cart::new(UserId::new());
        let l1 = line(2, 1000);
        let l2 = line(1, 500);
        let p1 = l1.product_id;

        cart.add_line(l1);
        cart.add_line(l2);
        assert_eq!(cart.total_price, Money::from_cents(2500));
        assert_eq!(cart.total_price, cart.computed_total());

        let removed = cart.remove_line(p1).unwrap();
        assert_eq!(removed.quantity, 2);
        assert_eq!(cart.total_price, Money::from_cents(500));
        assert_eq!(cart.total_price, cart.computed_total());
    }

    #[test]
    fn remove_missing_line_returns_none() {
        let mut cart = Cart::new(UserId::new());
        assert!(cart.remove_line(ProductId::new()).is_none());
        assert_eq!(cart.total_price, Money::zero());
    }

    #[test]
    fn clear_is_safe_on_empty_cart() {
        let mut cart = Cart::new(UserId::new());
        cart.clear();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Money::zero());
    }

    #[test]
    fn order_status_round_trips() {
        assert_eq!(OrderStatus::parse("Accepted"), Some(OrderStatus::Accepted));
        assert_eq!(OrderStatus::parse("Shipped"), None);
        assert_eq!(OrderStatus::Accepted.to_string(), "Accepted");
    }

    #[test]
    fn cart_serialization_round_trips() {
        let mut cart = Cart::new(UserId::new());
        cart.add_line(line(2, 1000));

        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }
}
