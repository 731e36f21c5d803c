//! Monetary amounts using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in Nepali rupees.
///
/// Backed by [`Decimal`] so totals never accumulate floating-point drift.
/// Serializes transparently as the decimal amount, which is how the backend
/// represents prices.
///
/// # Example
///
/// ```rust
/// use khaja_core::Money;
/// use rust_decimal::Decimal;
///
/// let price = Money::new(Decimal::new(25050, 2)); // Rs. 250.50
/// assert_eq!(price.display(), "Rs. 250.50");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from whole rupees.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Format for display (e.g., "Rs. 250.50").
    #[must_use]
    pub fn display(&self) -> String {
        format!("Rs. {:.2}", self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rs. {:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimal_places() {
        let price = Money::from_rupees(100);
        assert_eq!(price.display(), "Rs. 100.00");
    }

    #[test]
    fn test_line_total() {
        let price = Money::from_rupees(100);
        assert_eq!(price * 3, Money::from_rupees(300));
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_rupees(200), Money::from_rupees(50)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_rupees(250));
    }

    #[test]
    fn test_serde_transparent() {
        let price = Money::new(Decimal::new(9950, 2));
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"99.50\"");

        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, price);
    }
}
