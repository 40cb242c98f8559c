//! # Sales Report
//!
//! Date-range query validation and aggregation of the sales the backend
//! reports for that range.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Inclusive date range for a sales report.
///
/// Deserialization goes through [`SalesQuery::new`], so `start ≤ end` holds
/// for every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", try_from = "RawSalesQuery")]
#[ts(export)]
pub struct SalesQuery {
    #[ts(as = "String")]
    start: NaiveDate,
    #[ts(as = "String")]
    end: NaiveDate,
}

impl SalesQuery {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: format!("start date {} is after end date {}", start, end),
            });
        }
        Ok(SalesQuery { start, end })
    }

    /// Single-day report.
    pub fn day(date: NaiveDate) -> Self {
        SalesQuery {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSalesQuery {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawSalesQuery> for SalesQuery {
    type Error = ValidationError;

    fn try_from(raw: RawSalesQuery) -> Result<Self, Self::Error> {
        SalesQuery::new(raw.start, raw.end)
    }
}

// =============================================================================
// Records
// =============================================================================

/// One medicine line of a recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SoldItem {
    pub medicine_name: String,
    pub qty_sold: i64,
    pub mrp: Money,
    pub bill_amount: Money,
}

/// One bill as the backend recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleRecord {
    pub patient_id: String,
    pub items: Vec<SoldItem>,
    pub total_amount: Money,
    #[ts(as = "Option<String>")]
    pub transaction_time: Option<DateTime<Utc>>,
}

// =============================================================================
// Summary
// =============================================================================

/// Per-medicine totals within a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MedicineSales {
    pub medicine_name: String,
    pub quantity: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub query: SalesQuery,
    pub transaction_count: usize,
    /// Sum of `total_amount` over the records.
    pub total_earnings: Money,
    /// The figure the backend reported alongside the records.
    pub reported_earnings: Money,
    /// Highest revenue first; ties broken by name.
    pub by_medicine: Vec<MedicineSales>,
}

impl SalesSummary {
    pub fn from_records(query: SalesQuery, records: &[SaleRecord], reported_earnings: Money) -> Self {
        let mut per_medicine: BTreeMap<&str, (i64, Money)> = BTreeMap::new();
        for item in records.iter().flat_map(|r| r.items.iter()) {
            let entry = per_medicine
                .entry(item.medicine_name.as_str())
                .or_insert((0, Money::zero()));
            entry.0 += item.qty_sold;
            entry.1 += item.bill_amount;
        }

        let mut by_medicine: Vec<MedicineSales> = per_medicine
            .into_iter()
            .map(|(name, (quantity, revenue))| MedicineSales {
                medicine_name: name.to_string(),
                quantity,
                revenue,
            })
            .collect();
        // BTreeMap already gives name order; a stable sort keeps it for ties
        by_medicine.sort_by(|a, b| b.revenue.cmp(&a.revenue));

        SalesSummary {
            query,
            transaction_count: records.len(),
            total_earnings: records.iter().map(|r| r.total_amount).sum(),
            reported_earnings,
            by_medicine,
        }
    }

    /// Difference between the reported and recomputed earnings, if any.
    pub fn earnings_mismatch(&self) -> Option<Money> {
        let diff = self.reported_earnings - self.total_earnings;
        if diff.is_zero() {
            None
        } else {
            Some(diff)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(name: &str, qty: i64, amount: i64) -> SoldItem {
        SoldItem {
            medicine_name: name.to_string(),
            qty_sold: qty,
            mrp: Money::from_paise(amount / qty),
            bill_amount: Money::from_paise(amount),
        }
    }

    #[test]
    fn test_query_range() {
        assert!(SalesQuery::new(date(2026, 10, 1), date(2026, 10, 19)).is_ok());
        assert!(SalesQuery::new(date(2026, 10, 19), date(2026, 10, 19)).is_ok());
        assert!(SalesQuery::new(date(2026, 10, 20), date(2026, 10, 19)).is_err());
        assert_eq!(SalesQuery::day(date(2026, 1, 5)).end(), date(2026, 1, 5));
    }

    #[test]
    fn test_query_deserialize_checks_range() {
        let q: SalesQuery =
            serde_json::from_str(r#"{"start":"2026-10-01","end":"2026-10-19"}"#).unwrap();
        assert_eq!(q, SalesQuery::new(date(2026, 10, 1), date(2026, 10, 19)).unwrap());

        let reversed = serde_json::from_str::<SalesQuery>(r#"{"start":"2026-10-20","end":"2026-10-19"}"#);
        assert!(reversed.is_err());

        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(serde_json::from_str::<SalesQuery>(&json).unwrap(), q);
    }

    #[test]
    fn test_summary_aggregates_by_medicine() {
        let records = vec![
            SaleRecord {
                patient_id: "P-1".to_string(),
                items: vec![item("Paracetamol", 2, 2000), item("Cough Syrup", 1, 4450)],
                total_amount: Money::from_paise(6450),
                transaction_time: None,
            },
            SaleRecord {
                patient_id: "P-2".to_string(),
                items: vec![item("Paracetamol", 3, 3000)],
                total_amount: Money::from_paise(3000),
                transaction_time: None,
            },
        ];
        let query = SalesQuery::day(date(2026, 10, 19));
        let summary = SalesSummary::from_records(query, &records, Money::from_paise(9450));

        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_earnings, Money::from_paise(9450));
        assert_eq!(summary.earnings_mismatch(), None);

        assert_eq!(summary.by_medicine.len(), 2);
        assert_eq!(summary.by_medicine[0].medicine_name, "Paracetamol");
        assert_eq!(summary.by_medicine[0].quantity, 5);
        assert_eq!(summary.by_medicine[0].revenue, Money::from_paise(5000));
        assert_eq!(summary.by_medicine[1].medicine_name, "Cough Syrup");
    }

    #[test]
    fn test_ties_sorted_by_name_and_mismatch_reported() {
        let records = vec![SaleRecord {
            patient_id: "P-9".to_string(),
            items: vec![item("Zinc", 1, 500), item("Antacid", 1, 500)],
            total_amount: Money::from_paise(1000),
            transaction_time: None,
        }];
        let summary =
            SalesSummary::from_records(SalesQuery::day(date(2026, 1, 1)), &records, Money::from_paise(900));

        assert_eq!(summary.by_medicine[0].medicine_name, "Antacid");
        assert_eq!(summary.earnings_mismatch(), Some(Money::from_paise(-100)));
    }

    #[test]
    fn test_empty_report() {
        let summary =
            SalesSummary::from_records(SalesQuery::day(date(2026, 1, 1)), &[], Money::zero());
        assert_eq!(summary.transaction_count, 0);
        assert!(summary.by_medicine.is_empty());
        assert_eq!(summary.earnings_mismatch(), None);
    }
}
