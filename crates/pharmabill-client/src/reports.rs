//! Sales report fetch and aggregation.

use pharmabill_core::{SalesQuery, SalesSummary};
use tracing::{info, warn};

use crate::backend::PharmacyBackend;
use crate::error::{SessionError, SessionResult};

/// Fetches the sales for `query` and summarises them.
///
/// A disagreement between the backend's earnings figure and the recomputed
/// one is logged, not treated as an error.
pub async fn sales_summary(backend: &dyn PharmacyBackend, query: SalesQuery) -> SessionResult<SalesSummary> {
    let report = backend
        .sales(&query)
        .await
        .map_err(SessionError::LookupFailure)?;

    let summary = SalesSummary::from_records(query, &report.records, report.reported_earnings);
    if let Some(diff) = summary.earnings_mismatch() {
        warn!(
            reported = %summary.reported_earnings,
            recomputed = %summary.total_earnings,
            difference = %diff,
            "Backend earnings total does not match its transactions"
        );
    }

    info!(
        start = %query.start(),
        end = %query.end(),
        transactions = summary.transaction_count,
        earnings = %summary.total_earnings,
        "Sales report loaded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockPharmacyBackend, SalesReport};
    use crate::error::BackendError;
    use chrono::NaiveDate;
    use pharmabill_core::{Money, SaleRecord, SoldItem};

    fn query() -> SalesQuery {
        SalesQuery::new(
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sales_summary() {
        let mut backend = MockPharmacyBackend::new();
        backend
            .expect_sales()
            .withf(|q| q.start() == NaiveDate::from_ymd_opt(2026, 10, 1).unwrap())
            .returning(|_| {
                Ok(SalesReport {
                    records: vec![SaleRecord {
                        patient_id: "P-1".into(),
                        items: vec![SoldItem {
                            medicine_name: "Paracetamol".into(),
                            qty_sold: 2,
                            mrp: Money::from_paise(1000),
                            bill_amount: Money::from_paise(2000),
                        }],
                        total_amount: Money::from_paise(2000),
                        transaction_time: None,
                    }],
                    reported_earnings: Money::from_paise(2000),
                })
            });

        let summary = sales_summary(&backend, query()).await.unwrap();
        assert_eq!(summary.transaction_count, 1);
        assert_eq!(summary.by_medicine[0].quantity, 2);
        assert_eq!(summary.earnings_mismatch(), None);
    }

    #[tokio::test]
    async fn test_sales_failure_is_lookup_failure() {
        let mut backend = MockPharmacyBackend::new();
        backend.expect_sales().returning(|_| {
            Err(BackendError::Status {
                endpoint: "/sales".into(),
                status: 500,
                message: "An error occurred".into(),
            })
        });

        let err = sales_summary(&backend, query()).await.unwrap_err();
        assert!(matches!(err, SessionError::LookupFailure(_)));
    }
}
