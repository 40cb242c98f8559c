//! # Cart Builder
//!
//! Accumulates line items for one billing session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Form Action              Operation               Cart Change           │
//! │  ───────────              ─────────               ───────────           │
//! │                                                                         │
//! │  Add to Cart ───────────► add_line() ───────────► lines.push(line)     │
//! │                                                                         │
//! │  Click Remove ──────────► remove_line(i) ───────► lines.remove(i)      │
//! │                                                                         │
//! │  Click Edit ────────────► edit_line(i) ─────────► lines.remove(i)      │
//! │                            └─► LineDraft (pre-filled form)             │
//! │                                                                         │
//! │  Bill persisted ────────► clear() ──────────────► lines.clear()        │
//! │                                                                         │
//! │  NOTE: subtotal() is derived on every read, never stored.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::MedicineRef;
use crate::validation::{
    validate_cart_size, validate_medicine_name, validate_quantity, validate_unit_price,
};

// =============================================================================
// Cart Line
// =============================================================================

/// One medicine on the bill.
///
/// Fields are private and there is no `Deserialize`, so `line_amount`
/// always equals `quantity × unit_price`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct CartLine {
    medicine_name: String,
    quantity: i64,
    unit_price: Money,
    batch_no: String,
    #[ts(as = "String")]
    expiry_date: NaiveDate,
    line_amount: Money,
    /// Catalog MRP at selection time; differs from `unit_price` when the
    /// price was overridden at the counter.
    mrp: Money,
}

impl CartLine {
    /// Builds a line from a catalog snapshot.
    ///
    /// The unit price is the MRP unless `price_override` is given.
    pub fn new(
        medicine: &MedicineRef,
        quantity: i64,
        price_override: Option<Money>,
    ) -> Result<Self, ValidationError> {
        validate_medicine_name(&medicine.name)?;
        validate_quantity(quantity)?;

        let unit_price = price_override.unwrap_or(medicine.mrp);
        validate_unit_price(unit_price)?;
        let line_amount = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "line_amount".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

        Ok(CartLine {
            medicine_name: medicine.name.trim().to_string(),
            quantity,
            unit_price,
            batch_no: medicine.batch_no.clone(),
            expiry_date: medicine.expiry_date,
            line_amount,
            mrp: medicine.mrp,
        })
    }

    pub fn medicine_name(&self) -> &str {
        &self.medicine_name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn batch_no(&self) -> &str {
        &self.batch_no
    }

    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    pub fn line_amount(&self) -> Money {
        self.line_amount
    }

    /// Returns true when the unit price was entered manually.
    pub fn is_price_overridden(&self) -> bool {
        self.unit_price != self.mrp
    }

    /// The catalog snapshot this line was built from.
    pub fn medicine(&self) -> MedicineRef {
        MedicineRef {
            name: self.medicine_name.clone(),
            mrp: self.mrp,
            batch_no: self.batch_no.clone(),
            expiry_date: self.expiry_date,
        }
    }
}

// =============================================================================
// Line Draft
// =============================================================================

/// The "add item" form as a typed builder.
///
/// Setters never fail; everything is checked once in [`LineDraft::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineDraft {
    medicine_name: String,
    quantity: Option<i64>,
    price_override: Option<Money>,
    medicine: Option<MedicineRef>,
}

impl LineDraft {
    pub fn new() -> Self {
        LineDraft::default()
    }

    /// Sets the typed medicine name.
    ///
    /// A previously resolved medicine is dropped if the name no longer
    /// matches it.
    pub fn set_medicine_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.medicine_name = name.into();
        if self
            .medicine
            .as_ref()
            .is_some_and(|m| m.name != self.medicine_name.trim())
        {
            self.medicine = None;
        }
        self
    }

    pub fn set_quantity(&mut self, quantity: i64) -> &mut Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn set_price_override(&mut self, price: Option<Money>) -> &mut Self {
        self.price_override = price;
        self
    }

    /// Fills the draft from a catalog lookup result.
    pub fn apply_medicine(&mut self, medicine: MedicineRef) -> &mut Self {
        self.medicine_name = medicine.name.clone();
        self.medicine = Some(medicine);
        self
    }

    pub fn medicine_name(&self) -> &str {
        &self.medicine_name
    }

    pub fn quantity(&self) -> Option<i64> {
        self.quantity
    }

    pub fn price_override(&self) -> Option<Money> {
        self.price_override
    }

    pub fn medicine(&self) -> Option<&MedicineRef> {
        self.medicine.as_ref()
    }

    /// Unit price the line would be billed at, if a medicine is resolved.
    pub fn effective_unit_price(&self) -> Option<Money> {
        self.price_override
            .or_else(|| self.medicine.as_ref().map(|m| m.mrp))
    }

    /// Validates the form and produces a line. The draft itself is untouched.
    pub fn build(&self) -> Result<CartLine, ValidationError> {
        validate_medicine_name(&self.medicine_name)?;

        let medicine = self.medicine.as_ref().ok_or_else(|| ValidationError::Required {
            field: "medicine details".to_string(),
        })?;

        let quantity = self.quantity.ok_or_else(|| ValidationError::Required {
            field: "quantity".to_string(),
        })?;

        CartLine::new(medicine, quantity, self.price_override)
    }

    /// Clears the form after a successful add.
    pub fn clear(&mut self) {
        *self = LineDraft::default();
    }
}

impl From<&CartLine> for LineDraft {
    fn from(line: &CartLine) -> Self {
        LineDraft {
            medicine_name: line.medicine_name.clone(),
            quantity: Some(line.quantity),
            price_override: line.is_price_overridden().then_some(line.unit_price),
            medicine: Some(line.medicine()),
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress, unsaved list of line items for one billing session.
///
/// ## Invariants
/// - Lines keep insertion order (the invoice numbers them 1..n)
/// - Every line has quantity in 1..=999 and a non-negative unit price
/// - At most 100 lines
/// - `subtotal()` is the sum of `line_amount` over the current lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a line for a resolved medicine.
    ///
    /// On any validation failure the cart is left unchanged.
    pub fn add_line(
        &mut self,
        medicine: &MedicineRef,
        quantity: i64,
        price_override: Option<Money>,
    ) -> CoreResult<&CartLine> {
        let line = CartLine::new(medicine, quantity, price_override)?;
        self.push(line)
    }

    /// Appends an already validated line.
    pub fn push(&mut self, line: CartLine) -> CoreResult<&CartLine> {
        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: crate::MAX_CART_LINES,
        })?;

        self.lines.push(line);
        let index = self.lines.len() - 1;
        Ok(&self.lines[index])
    }

    /// Removes and returns the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<CartLine> {
        if index >= self.lines.len() {
            return Err(CoreError::LineIndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    /// Removes the line at `index` and returns it as a pre-filled draft.
    ///
    /// The line comes back only when the draft is submitted again.
    pub fn edit_line(&mut self, index: usize) -> CoreResult<LineDraft> {
        let line = self.remove_line(index)?;
        Ok(LineDraft::from(&line))
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&CartLine> {
        self.lines.get(index)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity of all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of all line amounts.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|l| l.line_amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart totals summary for UI responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
        }
    }
}
