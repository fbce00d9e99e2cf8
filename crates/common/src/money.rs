//! Money represented as an integer number of cents.
//!
//! Cart totals and order amounts are sums of `unit_price * quantity`
//! terms; integer cents keep those sums exact.

use serde::{Deserialize, Serialize};

/// A monetary amount in cents (1000 = $10.00). May be negative while
/// reconciling totals, but persisted amounts are non-negative.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from a whole-dollar value.
    pub fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// The zero amount.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Scales the amount by a quantity, e.g. a unit price to a line total.
    pub fn times(&self, quantity: u32) -> Money {
        Self(self.0 * i64::from(quantity))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Money {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Money {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_and_dollars() {
        assert_eq!(Money::from_cents(1234).cents(), 1234);
        assert_eq!(Money::from_dollars(50).cents(), 5000);
    }

    #[test]
    fn display_formats_dollars_and_cents() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!(a.times(3).cents(), 3000);

        let mut m = a;
        m += b;
        m -= Money::from_cents(50);
        assert_eq!(m.cents(), 1200);
    }

    #[test]
    fn sum_of_line_totals() {
        let total: Money = [Money::from_cents(1000).times(2), Money::from_cents(500)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 2500);
    }

    #[test]
    fn negative_detection() {
        assert!((Money::zero() - Money::from_cents(1)).is_negative());
        assert!(Money::zero().is_zero());
    }

    #[test]
    fn serialization_is_a_bare_number() {
        let json = serde_json::to_string(&Money::from_cents(999)).unwrap();
        assert_eq!(json, "999");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(999));
    }
}
