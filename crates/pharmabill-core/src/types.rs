//! # Domain Types
//!
//! Core domain types used throughout PharmaBill.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  MedicineRef    │   │  PatientInfo    │   │  ShopIdentity   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │   │  patient_id *   │   │  name           │       │
//! │  │  mrp (Money)    │   │  patient_name   │   │  address_lines  │       │
//! │  │  batch_no       │   │  patient_phone  │   │  phone, licence │       │
//! │  │  expiry_date    │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │  DiscountRate   │   │  PaymentMode    │                              │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  bps (u32)      │   │  Cash           │                              │
//! │  │  1000 = 10%     │   │  Online         │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{parse_hundredths, Money};
use crate::MAX_DISCOUNT_BPS;

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10% and 1250 bps = 12.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a rate from a whole percentage.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        DiscountRate(pct * 100)
    }

    /// Parses a percentage such as `"10"` or `"12.5"`, rejecting anything
    /// outside `[0, 100]`.
    ///
    /// ```rust
    /// use pharmabill_core::types::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::parse_percent("12.5").unwrap().bps(), 1250);
    /// assert!(DiscountRate::parse_percent("101").is_err());
    /// ```
    pub fn parse_percent(text: &str) -> Result<Self, ValidationError> {
        let bps = parse_hundredths(text, "discount")?;
        if !(0..=i64::from(MAX_DISCOUNT_BPS)).contains(&bps) {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(DiscountRate(bps as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display and the wire only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

/// Shows `10%`, `12.5%`, `12.75%`.
impl fmt::Display for DiscountRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        match frac {
            0 => write!(f, "{}%", whole),
            f10 if f10 % 10 == 0 => write!(f, "{}.{}%", whole, f10 / 10),
            _ => write!(f, "{}.{:02}%", whole, frac),
        }
    }
}

// =============================================================================
// Medicine Reference
// =============================================================================

/// Catalog snapshot of a medicine taken at selection time.
///
/// Not re-validated once copied into a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MedicineRef {
    pub name: String,
    /// Maximum retail price per unit.
    pub mrp: Money,
    pub batch_no: String,
    #[ts(as = "String")]
    pub expiry_date: NaiveDate,
}

// =============================================================================
// Payment Mode
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMode {
    /// Cash over the counter.
    #[default]
    Cash,
    /// UPI / card / bank transfer.
    Online,
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMode::Cash => write!(f, "Cash"),
            PaymentMode::Online => write!(f, "Online"),
        }
    }
}

impl FromStr for PaymentMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "online" | "upi" | "card" => Ok(PaymentMode::Online),
            other => Err(ValidationError::InvalidFormat {
                field: "mode_of_payment".to_string(),
                reason: format!("unknown payment mode '{}', expected cash or online", other),
            }),
        }
    }
}

// =============================================================================
// Patient
// =============================================================================

/// Patient identification attached to a bill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientInfo {
    /// Required, non-empty.
    pub patient_id: String,
    pub patient_name: String,
    pub patient_phone: String,
}

// =============================================================================
// Shop Identity
// =============================================================================

/// Shop details printed at the top of every invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct ShopIdentity {
    pub name: String,
    pub address_lines: Vec<String>,
    pub phone: Option<String>,
    /// Drug licence number.
    pub licence_no: Option<String>,
}

impl Default for ShopIdentity {
    fn default() -> Self {
        ShopIdentity {
            name: "PharmaBill Pharmacy".to_string(),
            address_lines: Vec::new(),
            phone: None,
            licence_no: None,
        }
    }
}

// =============================================================================
// Expiry Dates
// =============================================================================

/// Parses an expiry date in any of the formats the stock backend stores.
///
/// Full dates: `2026-05-31`, `31-05-2026`, `31/05/2026`, or an ISO datetime.
/// Month-only dates (`2026-05`, `05/2026`) mean the last day of that month.
///
/// ```rust
/// use chrono::NaiveDate;
/// use pharmabill_core::types::parse_expiry_date;
///
/// assert_eq!(parse_expiry_date("05/2026").unwrap(), NaiveDate::from_ymd_opt(2026, 5, 31).unwrap());
/// ```
pub fn parse_expiry_date(text: &str) -> Result<NaiveDate, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::Required {
            field: "expiry_date".to_string(),
        });
    }

    for format in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }

    let month_only = match (text.split_once('-'), text.split_once('/')) {
        (Some((year, month)), None) => Some((year, month)),
        (None, Some((month, year))) => Some((year, month)),
        _ => None,
    };

    if let Some((year, month)) = month_only {
        if year.len() == 4 {
            if let (Ok(year), Ok(month)) = (year.parse::<i32>(), month.parse::<u32>()) {
                if let Some(date) = last_day_of_month(year, month) {
                    return Ok(date);
                }
            }
        }
    }

    Err(ValidationError::InvalidFormat {
        field: "expiry_date".to_string(),
        reason: format!("unrecognised date '{}'", text),
    })
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next_month.pred_opt()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_discount_rate_parsing() {
        assert_eq!(DiscountRate::parse_percent("10").unwrap().bps(), 1000);
        assert_eq!(DiscountRate::parse_percent("0").unwrap(), DiscountRate::zero());
        assert_eq!(DiscountRate::parse_percent("100").unwrap().bps(), 10_000);
        assert_eq!(DiscountRate::parse_percent("7.25").unwrap().bps(), 725);

        assert!(DiscountRate::parse_percent("100.01").is_err());
        assert!(DiscountRate::parse_percent("-1").is_err());
        assert!(DiscountRate::parse_percent("ten").is_err());
    }

    #[test]
    fn test_discount_rate_display() {
        assert_eq!(DiscountRate::from_percent(10).to_string(), "10%");
        assert_eq!(DiscountRate::from_bps(1250).to_string(), "12.5%");
        assert_eq!(DiscountRate::from_bps(1275).to_string(), "12.75%");
        assert_eq!(DiscountRate::from_bps(5).to_string(), "0.05%");
    }

    #[test]
    fn test_payment_mode_parsing() {
        assert_eq!("cash".parse::<PaymentMode>().unwrap(), PaymentMode::Cash);
        assert_eq!("Online".parse::<PaymentMode>().unwrap(), PaymentMode::Online);
        assert_eq!("UPI".parse::<PaymentMode>().unwrap(), PaymentMode::Online);
        assert!("cheque".parse::<PaymentMode>().is_err());
        assert_eq!(PaymentMode::default(), PaymentMode::Cash);
    }

    #[test]
    fn test_expiry_full_dates() {
        assert_eq!(parse_expiry_date("2026-05-31").unwrap(), ymd(2026, 5, 31));
        assert_eq!(parse_expiry_date("31-05-2026").unwrap(), ymd(2026, 5, 31));
        assert_eq!(parse_expiry_date("31/05/2026").unwrap(), ymd(2026, 5, 31));
        assert_eq!(parse_expiry_date("2026-05-31T00:00:00").unwrap(), ymd(2026, 5, 31));
        assert_eq!(parse_expiry_date("2026-05-31T10:00:00+05:30").unwrap(), ymd(2026, 5, 31));
    }

    #[test]
    fn test_expiry_month_only_is_end_of_month() {
        assert_eq!(parse_expiry_date("2026-02").unwrap(), ymd(2026, 2, 28));
        assert_eq!(parse_expiry_date("12/2026").unwrap(), ymd(2026, 12, 31));
        assert_eq!(parse_expiry_date("2028-02").unwrap(), ymd(2028, 2, 29));
    }

    #[test]
    fn test_expiry_rejects_garbage() {
        assert!(parse_expiry_date("").is_err());
        assert!(parse_expiry_date("soon").is_err());
        assert!(parse_expiry_date("2026-13").is_err());
        assert!(parse_expiry_date("26-05").is_err());
    }
}
