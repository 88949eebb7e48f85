//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    99.99 + 12.99 * 2 = 125.97000000000001  ❌ WRONG!                    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    9999 + 1299 * 2 = 12597 cents, exactly                              │
//! │                                                                         │
//! │  Decimals only exist at the JSON boundary:                             │
//! │    "10.98" ──► Money::try_from_decimal ──► 1098 cents                  │
//! │    1098 cents ──► Money::to_decimal ──► "10.98"                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tillpoint_core::money::Money;
//!
//! let price = Money::from_cents(1299); // $12.99
//! let line = price * 2_i64;            // $25.98
//! let total = line + Money::from_cents(9999);
//! assert_eq!(total.cents(), 12597);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts can push a sale total below zero, and
///   that result is kept as-is
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money Flows
/// ```text
/// Product.price_cents ──► SaleItem.unit_price ──► SaleItem.subtotal
///                                                      │
///                          Σ subtotal − discount + tax ▼
///                                                 Sale.total
/// ```
/// Largest magnitude accepted from the API for a single amount (price,
/// discount, tax). Leaves room for a line of `MAX_ITEM_QUANTITY` units.
pub const MAX_AMOUNT_CENTS: i64 = i64::MAX / 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tillpoint_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a decimal amount from the API boundary into cents.
    ///
    /// ## Rules
    /// - At most two fractional digits (`10.985` is rejected, not rounded)
    /// - At most [`MAX_AMOUNT_CENTS`] in magnitude
    ///
    /// `field` names the offending input in the error.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use std::str::FromStr;
    /// use tillpoint_core::money::Money;
    ///
    /// let tax = Money::try_from_decimal("tax", Decimal::from_str("10.98").unwrap()).unwrap();
    /// assert_eq!(tax.cents(), 1098);
    /// assert!(Money::try_from_decimal("tax", Decimal::from_str("0.001").unwrap()).is_err());
    /// ```
    pub fn try_from_decimal(field: &str, amount: Decimal) -> Result<Self, ValidationError> {
        let out_of_range = || ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "amount is out of range".to_string(),
        };

        let scaled = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(out_of_range)?;
        if scaled.fract() != Decimal::ZERO {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "must have at most two decimal places".to_string(),
            });
        }

        let cents = scaled.trunc().to_i64().ok_or_else(out_of_range)?;
        if cents.unsigned_abs() > MAX_AMOUNT_CENTS as u64 {
            return Err(out_of_range());
        }
        Ok(Money(cents))
    }

    /// Returns the amount as a two-place decimal for JSON responses.
    ///
    /// ```rust
    /// use tillpoint_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(13195).to_decimal().to_string(), "131.95");
    /// assert_eq!(Money::from_cents(-500).to_decimal().to_string(), "-5.00");
    /// ```
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Multiplies money by a quantity, saturating at the i64 range.
    ///
    /// ## Example
    /// ```rust
    /// use tillpoint_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1299); // $12.99
    /// let line_total = unit_price.multiply_quantity(2);
    /// assert_eq!(line_total.cents(), 2598); // $25.98
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `self × qty`, or `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self + other`, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self - other`, or `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs. The dashboard formats amounts itself.
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

// Operators saturate so aggregates over stored rows never panic. Sale
// pricing uses the `checked_*` methods and rejects overflow instead.

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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
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

/// `#[serde(with = "as_decimal")]` for response types that carry `Money`
/// but should show `"131.95"` on the wire instead of cents.
pub mod as_decimal {
    use super::Money;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&money.to_decimal(), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::try_from_decimal("amount", amount).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
