//! # Discount & Settlement Calculator
//!
//! Pure function of `(subtotal, discount, tendered, mode)`.
//!
//! ```text
//! subtotal ──► discount_amount = round2(subtotal × pct / 100)
//!                    │
//!                    ▼
//!              discounted_total = subtotal − discount_amount
//!                    │
//!          ┌─────────┴──────────┐
//!          ▼                    ▼
//!   rounded_total          change = tendered − discounted_total
//!   (nearest rupee,        (None when nothing tendered)
//!    display only)
//! ```
//!
//! `change` is reconciled against the discounted total, not the rounded one.
//! The rounded figure is what is announced at the counter; the two can differ
//! by up to 50 paise.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DiscountRate, PaymentMode};
use crate::validation::validate_tendered;
use crate::MAX_DISCOUNT_BPS;

/// Checkout figures derived from the cart subtotal and counter input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Settlement {
    pub subtotal: Money,
    pub discount: DiscountRate,
    pub discount_amount: Money,
    pub discounted_total: Money,
    /// Whole rupees.
    pub rounded_total: i64,
    pub amount_tendered: Option<Money>,
    /// Negative when the patient handed over less than the discounted total.
    pub change: Option<Money>,
    pub payment_mode: PaymentMode,
}

impl Settlement {
    /// Computes the settlement. Validates the discount range and that the
    /// tendered amount is not negative.
    ///
    /// ```rust
    /// use pharmabill_core::{Money, DiscountRate, PaymentMode, Settlement};
    ///
    /// let s = Settlement::compute(
    ///     Money::from_paise(6550),
    ///     DiscountRate::from_percent(10),
    ///     Some(Money::from_rupees(60)),
    ///     PaymentMode::Cash,
    /// ).unwrap();
    ///
    /// assert_eq!(s.discount_amount.paise(), 655);
    /// assert_eq!(s.discounted_total.paise(), 5895);
    /// assert_eq!(s.rounded_total, 59);
    /// assert_eq!(s.change.unwrap().paise(), 105);
    /// ```
    pub fn compute(
        subtotal: Money,
        discount: DiscountRate,
        amount_tendered: Option<Money>,
        payment_mode: PaymentMode,
    ) -> Result<Settlement, ValidationError> {
        if discount.bps() > MAX_DISCOUNT_BPS {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: 100,
            });
        }
        if let Some(tendered) = amount_tendered {
            validate_tendered(tendered)?;
        }

        let discount_amount = subtotal.percentage(discount);
        let discounted_total = subtotal - discount_amount;

        Ok(Settlement {
            subtotal,
            discount,
            discount_amount,
            discounted_total,
            rounded_total: discounted_total.round_to_rupee(),
            amount_tendered,
            change: amount_tendered.map(|tendered| tendered - discounted_total),
            payment_mode,
        })
    }

    /// True when cash was tendered and it does not cover the discounted total.
    pub fn is_underpaid(&self) -> bool {
        self.change.is_some_and(|c| c.is_negative())
    }
}

/// Counter inputs for the settlement, kept by the session and recomputed into
/// a [`Settlement`] whenever the cart or any input changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettlementInputs {
    pub discount: DiscountRate,
    pub amount_tendered: Option<Money>,
    pub payment_mode: PaymentMode,
}

impl SettlementInputs {
    pub fn settle(&self, subtotal: Money) -> Result<Settlement, ValidationError> {
        Settlement::compute(subtotal, self.discount, self.amount_tendered, self.payment_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_scenario() {
        let s = Settlement::compute(
            Money::from_paise(6550),
            DiscountRate::from_percent(10),
            Some(Money::from_rupees(60)),
            PaymentMode::Cash,
        )
        .unwrap();

        assert_eq!(s.discount_amount, Money::from_paise(655));
        assert_eq!(s.discounted_total, Money::from_paise(5895));
        assert_eq!(s.rounded_total, 59);
        assert_eq!(s.change, Some(Money::from_paise(105)));
        assert!(!s.is_underpaid());
    }

    #[test]
    fn test_zero_discount_is_noop() {
        let s = Settlement::compute(Money::from_paise(12_345), DiscountRate::zero(), None, PaymentMode::Online)
            .unwrap();

        assert_eq!(s.discount_amount, Money::zero());
        assert_eq!(s.discounted_total, Money::from_paise(12_345));
        assert_eq!(s.rounded_total, 123);
    }

    #[test]
    fn test_change_omitted_without_tender() {
        let s = Settlement::compute(Money::from_paise(5000), DiscountRate::from_percent(5), None, PaymentMode::Cash)
            .unwrap();

        assert_eq!(s.amount_tendered, None);
        assert_eq!(s.change, None);
        assert!(!s.is_underpaid());
    }

    #[test]
    fn test_underpayment_gives_negative_change() {
        let s = Settlement::compute(
            Money::from_paise(5000),
            DiscountRate::zero(),
            Some(Money::from_rupees(40)),
            PaymentMode::Cash,
        )
        .unwrap();

        assert_eq!(s.change, Some(Money::from_paise(-1000)));
        assert!(s.is_underpaid());
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let inputs = SettlementInputs {
            discount: DiscountRate::from_bps(1250),
            amount_tendered: Some(Money::from_rupees(100)),
            payment_mode: PaymentMode::Cash,
        };
        let first = inputs.settle(Money::from_paise(9999)).unwrap();
        let second = inputs.settle(Money::from_paise(9999)).unwrap();

        assert_eq!(first, second);
        // 9999 × 12.5% = 1249.875 → 1250
        assert_eq!(first.discount_amount.paise(), 1250);
        assert_eq!(first.discounted_total.paise(), 8749);
        assert_eq!(first.rounded_total, 87);
    }

    #[test]
    fn test_full_discount() {
        let s = Settlement::compute(Money::from_paise(4321), DiscountRate::from_percent(100), None, PaymentMode::Cash)
            .unwrap();
        assert_eq!(s.discounted_total, Money::zero());
        assert_eq!(s.rounded_total, 0);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(Settlement::compute(Money::from_paise(100), DiscountRate::from_bps(10_001), None, PaymentMode::Cash)
            .is_err());
        assert!(Settlement::compute(
            Money::from_paise(100),
            DiscountRate::zero(),
            Some(Money::from_paise(-1)),
            PaymentMode::Cash
        )
        .is_err());
    }
}
