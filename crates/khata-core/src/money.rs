//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A khata that drifts by a paisa per entry never balances to zero.      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise (1 rupee = 100 paise)                     │
//! │    ₹500.00 credit − ₹200.00 cash = 50000 − 20000 = 30000 paise         │
//! │    Exact, every time. Decimal strings only at the API boundary.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use khata_core::money::Money;
//!
//! let credit = Money::from_paise(50000);       // ₹500.00
//! let paid: Money = "200".parse().unwrap();    // ₹200.00
//! assert_eq!((credit - paid).to_decimal_string(), "300.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// One rupee in paise.
pub const PAISE_PER_RUPEE: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (the smallest currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: balances go negative when a customer pays in advance
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serde as integer paise**: the decimal form is produced explicitly
///   with [`Money::to_decimal_string`]
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Sale.amount_paise ──┬──► Balance (Σ credit − Σ cash/upi)              │
/// │                      └──► CreditEntry.amount_paise                      │
/// │                                                                         │
/// │  Product.price_paise ──► Order line total ──► subtotal − discount      │
/// │                                                + delivery = total       │
/// │                                                     │                   │
/// │                                                     ▼                   │
/// │                                       Sale on COLLECTED (origin ORDER)  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// let amount = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(amount.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * PAISE_PER_RUPEE)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / PAISE_PER_RUPEE
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % PAISE_PER_RUPEE).abs()
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// let unit_price = Money::from_paise(2500); // ₹25.00
    /// assert_eq!(unit_price.multiply_quantity(4).paise(), 10000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Like [`multiply_quantity`](Self::multiply_quantity), `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Returns `bps` basis points of this amount (10000 bps = 100%),
    /// rounded half up to the nearest paisa.
    ///
    /// ## Example
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// let cart = Money::from_rupees(1000);
    /// assert_eq!(cart.percentage(2000), Money::from_rupees(200)); // 20%
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        // i128 keeps large carts from overflowing during the multiply
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_paise(part as i64)
    }

    /// Clamps the value into `[Money::zero(), ceiling]`.
    pub fn clamp_to(&self, ceiling: Money) -> Money {
        Money(self.0.max(0).min(ceiling.0.max(0)))
    }

    /// Renders the value as a plain decimal string with two fractional
    /// digits (`"1234.50"`, `"-5.00"`). This is the wire format for amounts.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a decimal rupee string into paise.
///
/// Accepts an optional leading `-`, a whole part, and at most two fractional
/// digits: `"500"`, `"500.5"`, `"500.50"`, `"-12.05"`. Anything finer than a
/// paisa is rejected rather than rounded.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("must be a decimal number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }
        if fraction.len() > 2 {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount is too large"))?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("must be a decimal number"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("must be a decimal number"))?,
        };

        let paise = whole
            .checked_mul(PAISE_PER_RUPEE)
            .and_then(|p| p.checked_add(fraction))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -paise } else { paise }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with the rupee sign (`₹1,234.50` is left to the
/// frontend; this renders `₹1234.50`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
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
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paise(1099)), "₹10.99");
        assert_eq!(format!("{}", Money::from_paise(500)), "₹5.00");
        assert_eq!(format!("{}", Money::from_paise(-550)), "-₹5.50");
        assert_eq!(format!("{}", Money::zero()), "₹0.00");
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(Money::from_paise(123450).to_decimal_string(), "1234.50");
        assert_eq!(Money::from_paise(-5).to_decimal_string(), "-0.05");
        assert_eq!(Money::zero().to_decimal_string(), "0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("500".parse::<Money>().unwrap().paise(), 50000);
        assert_eq!("500.5".parse::<Money>().unwrap().paise(), 50050);
        assert_eq!("500.05".parse::<Money>().unwrap().paise(), 50005);
        assert_eq!(".75".parse::<Money>().unwrap().paise(), 75);
        assert_eq!("-12.05".parse::<Money>().unwrap().paise(), -1205);
        assert_eq!(" 10 ".parse::<Money>().unwrap().paise(), 1000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
        assert!("12.345".parse::<Money>().is_err());
        assert!("1e3".parse::<Money>().is_err());
        assert!("12,00".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);
        assert_eq!((-a).paise(), -1000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.paise(), 2000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(Money::from_paise(10000).percentage(1000).paise(), 1000);
        // 8.25% of ₹10.00 = 82.5 paise → 83
        assert_eq!(Money::from_paise(1000).percentage(825).paise(), 83);
    }

    #[test]
    fn test_clamp_to() {
        let ceiling = Money::from_paise(500);
        assert_eq!(Money::from_paise(800).clamp_to(ceiling), ceiling);
        assert_eq!(Money::from_paise(300).clamp_to(ceiling).paise(), 300);
        assert_eq!(Money::from_paise(-10).clamp_to(ceiling), Money::zero());
    }
}
