//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A sale can draw from many batches at different purchase prices;        │
//! │  float COGS drifts a centavo at a time across thousands of              │
//! │  allocations and the profit report stops reconciling.                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    ₱10.99 is stored as 1099. Every allocation, every aggregate,         │
//! │    every percentage is integer math. Only the UI formats pesos.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Percentages (markup, profit margin) are carried in **basis points**:
//! 1 bp = 0.01%, so 1960 bps = 19.60%. That is exactly the two decimal
//! places of precision the profit reports need, with no float in sight.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for losses and corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every monetary value in the ledger flows through this type:
/// batch purchase/selling prices, per-allocation COGS/revenue/profit,
/// and the sale-level aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use botika_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents ₱10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-peso portion.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavo portion (always 0-99).
    #[inline]
    pub const fn centavo_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use botika_core::money::Money;
    ///
    /// let unit_cost = Money::from_cents(8000); // ₱80.00 purchase price
    /// let cogs = unit_cost.multiply_quantity(10);
    /// assert_eq!(cogs.cents(), 80000); // ₱800.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Computes markup in basis points: `(selling - purchase) / purchase`.
    ///
    /// Markup is expressed relative to **cost**. Returns 0 when the
    /// purchase price is zero or missing, matching the batch intake rule.
    ///
    /// ## Example
    /// ```rust
    /// use botika_core::money::Money;
    ///
    /// let purchase = Money::from_cents(8000);  // ₱80.00
    /// let selling = Money::from_cents(10000);  // ₱100.00
    /// // 25.00% markup over cost
    /// assert_eq!(Money::markup_bps(purchase, selling), 2500);
    /// ```
    pub fn markup_bps(purchase: Money, selling: Money) -> i64 {
        if purchase.0 <= 0 {
            return 0;
        }
        // Round half up in i128 to survive large price * 10000 products
        let delta = (selling.0 - purchase.0) as i128;
        let denom = purchase.0 as i128;
        ((delta * 10_000 + denom / 2) / denom) as i64
    }

    /// Computes profit margin in basis points: `profit / revenue`.
    ///
    /// Margin is expressed relative to **revenue** - distinct from markup
    /// and never interchangeable with it. Defined as 0 when revenue is 0.
    ///
    /// ## Example
    /// ```rust
    /// use botika_core::money::Money;
    ///
    /// let profit = Money::from_cents(30000);    // ₱300.00
    /// let revenue = Money::from_cents(152500);  // ₱1,525.00
    /// // 19.67% of revenue
    /// assert_eq!(Money::margin_bps(profit, revenue), 1967);
    /// ```
    pub fn margin_bps(profit: Money, revenue: Money) -> i64 {
        if revenue.0 == 0 {
            return 0;
        }
        let num = profit.0 as i128;
        let denom = revenue.0 as i128;
        ((num * 10_000 + denom / 2) / denom) as i64
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. Use frontend formatting for actual UI
/// display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₱{}.{:02}", sign, self.pesos().abs(), self.centavo_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.pesos(), 10);
        assert_eq!(money.centavo_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "₱10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "₱5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-₱5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "₱0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(8500);
        let cogs = unit_price.multiply_quantity(5);
        assert_eq!(cogs.cents(), 42500);
    }

    #[test]
    fn test_markup_bps() {
        // ₱80 -> ₱100 is a 25% markup over cost
        let m = Money::markup_bps(Money::from_cents(8000), Money::from_cents(10000));
        assert_eq!(m, 2500);

        // ₱85 -> ₱105 is 23.53% (rounded from 23.529...)
        let m = Money::markup_bps(Money::from_cents(8500), Money::from_cents(10500));
        assert_eq!(m, 2353);
    }

    #[test]
    fn test_markup_bps_zero_purchase_is_zero() {
        // Zero or missing purchase price yields no markup, not a div-by-zero
        assert_eq!(Money::markup_bps(Money::zero(), Money::from_cents(10000)), 0);
        assert_eq!(Money::markup_bps(Money::from_cents(-1), Money::from_cents(10)), 0);
    }

    #[test]
    fn test_margin_bps() {
        // ₱300 profit on ₱1,525 revenue = 19.67% margin
        let m = Money::margin_bps(Money::from_cents(30000), Money::from_cents(152500));
        assert_eq!(m, 1967);

        // Zero revenue defines margin as 0
        assert_eq!(Money::margin_bps(Money::from_cents(100), Money::zero()), 0);
    }

    #[test]
    fn test_markup_and_margin_differ() {
        // The classic confusion: same prices, different denominators.
        let purchase = Money::from_cents(8000);
        let selling = Money::from_cents(10000);
        let markup = Money::markup_bps(purchase, selling);
        let margin = Money::margin_bps(selling - purchase, selling);
        assert_eq!(markup, 2500); // 25% of cost
        assert_eq!(margin, 2000); // 20% of revenue
        assert_ne!(markup, margin);
    }
}
