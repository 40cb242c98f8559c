//! # Sales Report Command

use chrono::NaiveDate;
use pharmabill_client::{reports, PharmacyBackend};
use pharmabill_core::SalesQuery;

use crate::error::CliError;
use crate::output;

/// Prints the report for `from..=to` (a single day when `to` is omitted).
pub async fn sales(
    backend: &dyn PharmacyBackend,
    from: NaiveDate,
    to: Option<NaiveDate>,
) -> Result<(), CliError> {
    let query = SalesQuery::new(from, to.unwrap_or(from))?;
    let summary = reports::sales_summary(backend, query).await?;

    println!(
        "Sales {} to {}: {} bill(s), earnings {}",
        summary.query.start(),
        summary.query.end(),
        summary.transaction_count,
        summary.total_earnings
    );
    if let Some(diff) = summary.earnings_mismatch() {
        println!(
            "Note: backend reported {} ({} difference)",
            summary.reported_earnings, diff
        );
    }
    if !summary.by_medicine.is_empty() {
        println!("{}", output::sales_table(&summary));
    }
    Ok(())
}
