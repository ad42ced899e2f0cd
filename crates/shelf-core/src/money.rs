//! # Money Module
//!
//! Integer-cent money for prices, line totals, discounts and tax.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Book.price_cents ──► CartLine.unit_price ──► CartLine.subtotal         │
//! │                                                                         │
//! │  DraftSale.subtotal ──┬──► discount amount (percentage, half-up)        │
//! │                       └──► tax (8%, half-up)                            │
//! │                                                                         │
//! │  total = subtotal - discount + tax ──► Sale.total_cents                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::money::Money;
//!
//! let price = Money::from_cents(1000); // $10.00
//! let line = price * 3;
//! assert_eq!(line.cents(), 3000);
//! assert_eq!(line.percentage(1000).cents(), 300); // 10%
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// A monetary value in the smallest currency unit (cents).
///
/// Arithmetic saturates at the `i64` bounds rather than panicking. Inputs are
/// bounded upstream (`MAX_PRICE_CENTS`, `MAX_LINE_QUANTITY`) so real totals
/// never get near them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use shelf_core::money::Money;
    ///
    /// let price = Money::from_cents(1299);
    /// assert_eq!(price.cents(), 1299);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from dollars and cents.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole dollars, truncated toward zero.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Cents portion, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Tax on this amount, rounded half-up to the cent.
    ///
    /// ```rust
    /// use shelf_core::money::Money;
    /// use shelf_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(3000); // $30.00
    /// assert_eq!(subtotal.calculate_tax(TaxRate::from_bps(800)).cents(), 240);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage(rate.bps())
    }

    /// The given share of this amount in basis points, rounded half-up.
    ///
    /// i128 intermediate so large subtotals cannot overflow.
    pub fn percentage(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money(cents as i64)
    }

    /// Unit price times quantity, saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!(a.multiply_quantity(4).cents(), 4000);
    }

    #[test]
    fn test_eight_percent_tax() {
        // $30.00 at 8% = $2.40
        let tax = Money::from_cents(3000).calculate_tax(TaxRate::from_bps(800));
        assert_eq!(tax.cents(), 240);

        // $12.99 at 8% = $1.0392 → $1.04
        let tax = Money::from_cents(1299).calculate_tax(TaxRate::from_bps(800));
        assert_eq!(tax.cents(), 104);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 12.5% of $0.20 = 2.5 cents → 3
        assert_eq!(Money::from_cents(20).percentage(1250).cents(), 3);
        assert_eq!(Money::from_cents(10000).percentage(10000).cents(), 10000);
        assert_eq!(Money::from_cents(10000).percentage(0).cents(), 0);
    }

    #[test]
    fn test_sum_and_floor() {
        let total: Money = [100, 250, 5].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 355);
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_overflowing() {
        let price = Money::from_cents(1000);
        assert_eq!(price.multiply_quantity(i64::MAX / 2).cents(), i64::MAX);
        assert_eq!((price * i64::MIN).cents(), i64::MIN);

        let big = Money::from_cents(i64::MAX);
        assert_eq!((big + price).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - price).cents(), i64::MIN);

        let total: Money = [big, big].iter().sum();
        assert_eq!(total.cents(), i64::MAX);
        assert!(big.percentage(800).cents() > 0);
    }
}
