//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    65.50 × 0.10 = 6.550000000000001  ❌ WRONG!                          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    6550 paise × 1000 bps / 10000 = 655 paise (₹6.55)                   │
//! │    Every "round to 2 decimals" is an exact integer division            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharmabill_core::money::Money;
//!
//! // Create from paise (preferred)
//! let mrp = Money::from_paise(1050); // ₹10.50
//!
//! // Arithmetic operations
//! let doubled = mrp * 2;                       // ₹21.00
//! let total = mrp + Money::from_paise(500);    // ₹15.50
//!
//! // Wire values are parsed from their decimal text, never from f64
//! let parsed = Money::parse_major("45.5").unwrap();
//! assert_eq!(parsed.paise(), 4550);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: change can be negative when the patient underpays
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// MedicineRef.mrp ──► CartLine.unit_price ──► CartLine.line_amount
///                                                    │
///                     Cart.subtotal() ◄──────────────┘
///                           │
///                           ▼
///       Settlement: discount_amount, discounted_total, change
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ```rust
    /// use pharmabill_core::money::Money;
    ///
    /// let mrp = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(mrp.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Parses a decimal rupee amount such as `"45.5"`, `"10"` or `"-3.25"`.
    ///
    /// At most two fractional digits are accepted; extra digits are an error
    /// rather than a silent rounding.
    ///
    /// ```rust
    /// use pharmabill_core::money::Money;
    ///
    /// assert_eq!(Money::parse_major("65.50").unwrap().paise(), 6550);
    /// assert_eq!(Money::parse_major("7").unwrap().paise(), 700);
    /// assert!(Money::parse_major("1.234").is_err());
    /// ```
    pub fn parse_major(text: &str) -> Result<Money, ValidationError> {
        parse_hundredths(text, "amount").map(Money)
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use pharmabill_core::money::Money;
    ///
    /// let mrp = Money::from_paise(1000);
    /// assert_eq!(mrp.multiply_quantity(2).paise(), 2000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, or `None` on overflow.
    ///
    /// ```rust
    /// use pharmabill_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(1000).checked_multiply_quantity(3), Some(Money::from_paise(3000)));
    /// assert_eq!(Money::from_paise(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Returns `rate` of this amount, rounded to the nearest paisa
    /// (half away from zero).
    ///
    /// ## Example
    /// ```rust
    /// use pharmabill_core::money::Money;
    /// use pharmabill_core::types::DiscountRate;
    ///
    /// let subtotal = Money::from_paise(6550);   // ₹65.50
    /// let ten_pct = DiscountRate::from_bps(1000);
    /// assert_eq!(subtotal.percentage(ten_pct).paise(), 655); // ₹6.55
    /// ```
    pub fn percentage(&self, rate: DiscountRate) -> Money {
        // i128 keeps large carts from overflowing before the division
        let scaled = self.0 as i128 * rate.bps() as i128;
        Money::from_paise(div_round_half_away(scaled, 10_000) as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ```rust
    /// use pharmabill_core::money::Money;
    /// use pharmabill_core::types::DiscountRate;
    ///
    /// let subtotal = Money::from_paise(10000); // ₹100.00
    /// let discounted = subtotal.apply_percentage_discount(DiscountRate::from_bps(1000));
    /// assert_eq!(discounted.paise(), 9000);
    /// ```
    pub fn apply_percentage_discount(&self, rate: DiscountRate) -> Money {
        *self - self.percentage(rate)
    }

    /// Rounds to the nearest whole rupee, halves rounding up.
    ///
    /// ```rust
    /// use pharmabill_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(5895).round_to_rupee(), 59);
    /// assert_eq!(Money::from_paise(5850).round_to_rupee(), 59);
    /// assert_eq!(Money::from_paise(5849).round_to_rupee(), 58);
    /// ```
    pub fn round_to_rupee(&self) -> i64 {
        (self.0 + 50).div_euclid(100)
    }

    /// Rupee value as a JSON-friendly float, for the wire format only.
    ///
    /// Two-decimal values survive the round trip through `f64` exactly as
    /// printed, so this is safe for serialization but never for arithmetic.
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Decimal Parsing
// =============================================================================

/// Parses a decimal string with at most two fractional digits into an integer
/// count of hundredths. Shared by `Money` (paise) and `DiscountRate` (bps).
pub(crate) fn parse_hundredths(text: &str, field: &str) -> Result<i64, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (digits, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid("expected a number"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected a decimal number"));
    }
    if frac.len() > 2 {
        return Err(invalid("at most two decimal places are allowed"));
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid("number is too large"))?
    };
    let frac_value: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid("expected a decimal number"))? * 10,
        _ => frac.parse().map_err(|_| invalid("expected a decimal number"))?,
    };

    let magnitude = whole_value
        .checked_mul(100)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| invalid("number is too large"))?;

    Ok(if negative { -magnitude } else { magnitude })
}

/// Integer division rounding halves away from zero.
fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `₹12.34`.
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
        iter.copied().sum()
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
        assert_eq!(Money::from_paise(6550).to_string(), "₹65.50");
        assert_eq!(Money::from_paise(105).to_string(), "₹1.05");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_parse_major() {
        assert_eq!(Money::parse_major("10").unwrap().paise(), 1000);
        assert_eq!(Money::parse_major("45.5").unwrap().paise(), 4550);
        assert_eq!(Money::parse_major("0.05").unwrap().paise(), 5);
        assert_eq!(Money::parse_major(".5").unwrap().paise(), 50);
        assert_eq!(Money::parse_major("-3.25").unwrap().paise(), -325);

        assert!(Money::parse_major("").is_err());
        assert!(Money::parse_major("abc").is_err());
        assert!(Money::parse_major("1.234").is_err());
        assert!(Money::parse_major("1.2.3").is_err());
        assert!(Money::parse_major(".").is_err());
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_paise(2000);
        let b = Money::from_paise(4550);

        assert_eq!((a + b).paise(), 6550);
        assert_eq!((b - a).paise(), 2550);
        assert_eq!((a * 3).paise(), 6000);

        let total: Money = [a, b].iter().sum();
        assert_eq!(total.paise(), 6550);
    }

    #[test]
    fn test_percentage_rounds_half_away_from_zero() {
        // ₹0.05 at 10% = 0.5 paisa → 1 paisa
        assert_eq!(Money::from_paise(5).percentage(DiscountRate::from_bps(1000)).paise(), 1);
        // ₹0.04 at 10% = 0.4 paisa → 0
        assert_eq!(Money::from_paise(4).percentage(DiscountRate::from_bps(1000)).paise(), 0);
        assert_eq!(Money::from_paise(-5).percentage(DiscountRate::from_bps(1000)).paise(), -1);
    }

    #[test]
    fn test_zero_discount_is_noop() {
        let subtotal = Money::from_paise(12345);
        assert_eq!(subtotal.apply_percentage_discount(DiscountRate::zero()), subtotal);
    }

    #[test]
    fn test_round_to_rupee() {
        assert_eq!(Money::from_paise(5895).round_to_rupee(), 59);
        assert_eq!(Money::from_paise(5849).round_to_rupee(), 58);
        assert_eq!(Money::from_paise(5850).round_to_rupee(), 59);
        assert_eq!(Money::zero().round_to_rupee(), 0);
    }

    #[test]
    fn test_to_major_f64() {
        assert_eq!(Money::from_paise(4550).to_major_f64(), 45.5);
        assert_eq!(serde_json::json!(Money::from_paise(655).to_major_f64()).to_string(), "6.55");
    }
}
