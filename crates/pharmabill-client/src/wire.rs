//! # Backend Wire Format
//!
//! JSON bodies exchanged with the pharmacy backend and their conversion to
//! core types.
//!
//! ```text
//! GET  /medicines                      → { "medicines": ["PARACETAMOL", ...] }
//! GET  /medicine_details?name=<name>   → { "mrp": 10.5, "batch_no": "B1",
//!                                          "expiry_date": "2027-03-31" }
//! POST /billing                        ← BillingRequest
//!                                      → { "message": "..." }   (2xx)
//!                                      → { "error": "..." }     (4xx/5xx)
//! GET  /sales?start_date=&end_date=    → { "sales": [...], "total_earnings": 0 }
//! ```
//!
//! Amounts arrive as JSON numbers (integer or fractional rupees) or as
//! decimal strings; they are converted to paise once, here.

use chrono::{DateTime, NaiveDateTime, Utc};
use pharmabill_core::types::parse_expiry_date;
use pharmabill_core::{MedicineRef, Money, SaleRecord, SoldItem, TransactionDraft};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MedicineListResponse {
    #[serde(default)]
    pub medicines: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicineDetailsResponse {
    pub mrp: Value,
    #[serde(default)]
    pub batch_no: String,
    #[serde(default)]
    pub expiry_date: String,
}

impl MedicineDetailsResponse {
    pub fn into_medicine(self, name: &str) -> Result<MedicineRef, String> {
        let mrp = amount_from_json(&self.mrp, "mrp")?;
        if mrp.is_negative() {
            return Err(format!("negative mrp {} for {}", mrp, name));
        }
        let expiry_date = parse_expiry_date(&self.expiry_date).map_err(|e| e.to_string())?;

        Ok(MedicineRef {
            name: name.to_string(),
            mrp,
            batch_no: self.batch_no.trim().to_string(),
            expiry_date,
        })
    }
}

/// Body of a non-2xx response, when the backend sends one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message from a raw response body.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                error: Some(error), ..
            }) => error,
            Ok(ErrorBody {
                message: Some(message),
                ..
            }) => message,
            _ if body.trim().is_empty() => "no details".to_string(),
            _ => body.trim().chars().take(200).collect(),
        }
    }
}

// =============================================================================
// Billing
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingItem {
    pub medicine_name: String,
    pub qty_sold: i64,
    pub mrp: f64,
    pub batch_no: String,
    /// `YYYY-MM-DD`
    pub expiry_date: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingRequest {
    pub patient_id: String,
    pub patient_name: String,
    pub patient_phone: String,
    /// Percent, e.g. `12.5`.
    pub discount: f64,
    #[serde(rename = "amountAccepted")]
    pub amount_accepted: Option<f64>,
    pub mode_of_payment: String,
    pub medicines: Vec<BillingItem>,
}

impl From<&TransactionDraft> for BillingRequest {
    fn from(draft: &TransactionDraft) -> Self {
        let settlement = &draft.settlement;
        BillingRequest {
            patient_id: draft.patient.patient_id.clone(),
            patient_name: draft.patient.patient_name.clone(),
            patient_phone: draft.patient.patient_phone.clone(),
            discount: settlement.discount.percentage(),
            amount_accepted: settlement.amount_tendered.map(|m| m.to_major_f64()),
            mode_of_payment: settlement.payment_mode.to_string(),
            medicines: draft
                .lines
                .iter()
                .map(|line| BillingItem {
                    medicine_name: line.medicine_name().to_string(),
                    qty_sold: line.quantity(),
                    mrp: line.unit_price().to_major_f64(),
                    batch_no: line.batch_no().to_string(),
                    expiry_date: line.expiry_date().format("%Y-%m-%d").to_string(),
                    amount: line.line_amount().to_major_f64(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SalesResponse {
    #[serde(default)]
    pub sales: Vec<SaleDto>,
    #[serde(default)]
    pub total_earnings: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleDto {
    pub patient_id: String,
    #[serde(default)]
    pub medicines: Vec<SoldItemDto>,
    pub total_amount: Value,
    #[serde(default)]
    pub transaction_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoldItemDto {
    pub medicine_name: String,
    pub qty_sold: i64,
    pub mrp: Value,
    pub bill_amount: Value,
}

impl SalesResponse {
    /// Records plus the earnings figure the backend reported. A missing
    /// `total_earnings` is taken as the sum of the records.
    pub fn into_records(self) -> Result<(Vec<SaleRecord>, Money), String> {
        let records = self
            .sales
            .into_iter()
            .map(|sale| {
                let items = sale
                    .medicines
                    .into_iter()
                    .map(|item| {
                        Ok(SoldItem {
                            mrp: amount_from_json(&item.mrp, "mrp")?,
                            bill_amount: amount_from_json(&item.bill_amount, "bill_amount")?,
                            medicine_name: item.medicine_name,
                            qty_sold: item.qty_sold,
                        })
                    })
                    .collect::<Result<Vec<_>, String>>()?;

                Ok(SaleRecord {
                    patient_id: sale.patient_id,
                    items,
                    total_amount: amount_from_json(&sale.total_amount, "total_amount")?,
                    transaction_time: sale.transaction_time.as_deref().and_then(parse_timestamp),
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        let reported = match self.total_earnings {
            Some(ref value) if !value.is_null() => amount_from_json(value, "total_earnings")?,
            _ => records.iter().map(|r| r.total_amount).sum(),
        };

        Ok((records, reported))
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Rupee amount from a JSON number or decimal string.
pub fn amount_from_json(value: &Value, field: &str) -> Result<Money, String> {
    match value {
        Value::Number(n) => {
            if let Some(rupees) = n.as_i64() {
                return rupees
                    .checked_mul(100)
                    .map(Money::from_paise)
                    .ok_or_else(|| format!("{} out of range", field));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.abs() < 1e15 => {
                    Ok(Money::from_paise((f * 100.0).round() as i64))
                }
                _ => Err(format!("{} is not a valid amount", field)),
            }
        }
        Value::String(s) => Money::parse_major(s).map_err(|e| format!("{}: {}", field, e)),
        other => Err(format!("{} has unexpected JSON type: {}", field, other)),
    }
}

/// Accepts RFC 3339, naive ISO 8601 (taken as UTC) and RFC 2822.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
