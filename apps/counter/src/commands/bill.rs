//! # Bill Command
//!
//! Drives one [`BillingSession`] from the command line.
//!
//! ```text
//! --patient-*  ──► set_patient
//! --item ...   ──► select_medicine ─► set_quantity ─► set_price_override ─► add_draft_line
//! --discount / --tendered / --mode ──► settlement table
//!                                          │
//!                       --dry-run ◄────────┤
//!                                          ▼
//!                               checkout (POST /billing)
//!                                          │
//!                          saved ──► invoice file under --out / invoice.output_dir
//! ```
//!
//! Nothing is written unless the backend confirms the bill.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pharmabill_client::{BillingSession, ClientConfig, CompletedBill, PharmacyBackend};
use pharmabill_core::{Money, PatientInfo, Settlement};
use tracing::{error, info, warn};

use crate::cli::BillArgs;
use crate::error::CliError;
use crate::output;

/// What the command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillOutcome {
    /// Settlement shown, nothing sent.
    DryRun(Settlement),
    /// Bill saved and invoice written to `invoice_path`.
    Saved {
        settlement: Settlement,
        invoice_path: PathBuf,
    },
}

pub async fn bill(
    backend: Arc<dyn PharmacyBackend>,
    config: &ClientConfig,
    args: BillArgs,
) -> Result<BillOutcome, CliError> {
    let mut session = BillingSession::new(backend, config.shop.clone());

    session.set_patient(PatientInfo {
        patient_id: args.patient_id.clone(),
        patient_name: args.patient_name.clone(),
        patient_phone: args.phone.clone(),
    })?;

    for item in &args.items {
        let medicine = session.select_medicine(&item.name).await?;
        info!(medicine = %medicine.name, mrp = %medicine.mrp, batch = %medicine.batch_no, "Medicine selected");
        session.set_quantity(item.quantity);
        session.set_price_override(item.price);
        session.add_draft_line()?;
    }

    if let Some(discount) = args.discount {
        session.set_discount(discount)?;
    }
    session.set_amount_tendered(args.tendered)?;
    session.set_payment_mode(args.mode)?;

    let settlement = session.settlement()?;
    println!("{}", output::cart_table(session.cart()));
    println!("{}", output::settlement_table(&settlement));
    if settlement.is_underpaid() {
        let short = Money::zero() - settlement.change.unwrap_or_default();
        warn!(short = %short, "Amount received does not cover the total");
        println!("Warning: amount received is short by {}", short);
    }

    if args.dry_run {
        println!("Dry run: bill not saved.");
        return Ok(BillOutcome::DryRun(settlement));
    }

    let completed = session.checkout().await?;
    let dir = args
        .out
        .clone()
        .unwrap_or_else(|| config.invoice.output_dir.clone());
    let invoice_path = deliver_invoice(&dir, &completed, &mut io::stdout())?;

    println!(
        "Bill saved for {} at {}",
        completed.transaction.patient().patient_id,
        completed.transaction.persisted_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(message) = completed.transaction.backend_message() {
        println!("Backend: {}", message);
    }
    println!("Invoice: {}", invoice_path.display());

    Ok(BillOutcome::Saved {
        settlement: *completed.transaction.settlement(),
        invoice_path,
    })
}

/// Writes the invoice file. If that fails the bill is already saved, so the
/// invoice text goes to `fallback` and the error says so.
fn deliver_invoice<W: Write>(
    dir: &Path,
    completed: &CompletedBill,
    fallback: &mut W,
) -> Result<PathBuf, CliError> {
    match output::write_invoice(dir, &completed.document) {
        Ok(path) => Ok(path),
        Err(e) => {
            let patient_id = &completed.transaction.patient().patient_id;
            error!(patient_id = %patient_id, dir = %dir.display(), error = %e, "Saved bill has no invoice file");

            let printed = writeln!(fallback, "{}", completed.document.to_text())
                .and_then(|_| fallback.flush())
                .is_ok();
            Err(CliError::invoice_not_written(patient_id, dir, &e, printed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ItemSpec;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pharmabill_client::{BackendError, BackendResult, BillReceipt, SalesReport};
    use pharmabill_core::{
        DiscountRate, MedicineRef, PaymentMode, SalesQuery, TransactionDraft,
    };
    use std::sync::Mutex;

    /// Serves a fixed catalog and records submitted bills.
    struct FakeBackend {
        fail_billing: bool,
        submitted: Mutex<Vec<TransactionDraft>>,
    }

    impl FakeBackend {
        fn new(fail_billing: bool) -> Arc<Self> {
            Arc::new(FakeBackend {
                fail_billing,
                submitted: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PharmacyBackend for FakeBackend {
        async fn list_medicines(&self) -> BackendResult<Vec<String>> {
            Ok(vec!["Paracetamol".into(), "Cough Syrup".into()])
        }

        async fn medicine_details(&self, name: &str) -> BackendResult<MedicineRef> {
            let (mrp, batch) = match name {
                "Paracetamol" => (1250, "PCM-01"),
                "Cough Syrup" => (4050, "CS-7"),
                _ => return Err(BackendError::NotFound(name.to_string())),
            };
            Ok(MedicineRef {
                name: name.to_string(),
                mrp: Money::from_paise(mrp),
                batch_no: batch.to_string(),
                expiry_date: NaiveDate::from_ymd_opt(2027, 6, 30).unwrap(),
            })
        }

        async fn submit_bill(&self, draft: &TransactionDraft) -> BackendResult<BillReceipt> {
            if self.fail_billing {
                return Err(BackendError::Status {
                    endpoint: "billing".into(),
                    status: 500,
                    message: "database unavailable".into(),
                });
            }
            self.submitted.lock().unwrap().push(draft.clone());
            Ok(BillReceipt {
                message: Some("Billing successful".into()),
            })
        }

        async fn sales(&self, query: &SalesQuery) -> BackendResult<SalesReport> {
            Err(BackendError::NotFound(query.start().to_string()))
        }
    }

    fn args(out: PathBuf, dry_run: bool) -> BillArgs {
        BillArgs {
            patient_id: "P-1001".into(),
            patient_name: "Asha".into(),
            phone: "9876543210".into(),
            items: vec![
                "Paracetamol=2".parse::<ItemSpec>().unwrap(),
                "Cough Syrup=1".parse::<ItemSpec>().unwrap(),
            ],
            discount: Some(DiscountRate::from_percent(10)),
            tendered: Some(Money::from_rupees(60)),
            mode: PaymentMode::Cash,
            out: Some(out),
            dry_run,
        }
    }

    #[tokio::test]
    async fn test_bill_saves_and_writes_invoice() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::new(false);

        let outcome = bill(backend.clone(), &ClientConfig::default(), args(dir.path().to_path_buf(), false))
            .await
            .unwrap();

        let BillOutcome::Saved { settlement, invoice_path } = outcome else {
            panic!("expected a saved bill");
        };
        assert_eq!(settlement.subtotal, Money::from_paise(6550));
        assert_eq!(settlement.discounted_total, Money::from_paise(5895));
        assert_eq!(settlement.rounded_total, 59);
        assert_eq!(settlement.change, Some(Money::from_paise(105)));

        assert!(invoice_path.ends_with("invoice-P-1001.txt"));
        let text = std::fs::read_to_string(&invoice_path).unwrap();
        assert!(text.contains("Cough Syrup"));

        let submitted = backend.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].lines.len(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FakeBackend::new(false);

        let outcome = bill(backend.clone(), &ClientConfig::default(), args(dir.path().join("out"), true))
            .await
            .unwrap();

        assert!(matches!(outcome, BillOutcome::DryRun(_)));
        assert!(backend.submitted.lock().unwrap().is_empty());
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_failed_billing_writes_no_invoice() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let err = bill(FakeBackend::new(true), &ClientConfig::default(), args(out.clone(), false))
            .await
            .unwrap_err();

        assert_eq!(err.code, crate::error::ErrorCode::PersistenceFailed);
        assert!(err.retryable);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_unwritable_invoice_dir_reports_saved_bill() {
        let dir = tempfile::tempdir().unwrap();
        // a plain file where the invoice directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();
        let backend = FakeBackend::new(false);

        let err = bill(backend.clone(), &ClientConfig::default(), args(blocker.join("invoices"), false))
            .await
            .unwrap_err();

        assert_eq!(err.code, crate::error::ErrorCode::InvoiceNotWritten);
        assert!(!err.retryable);
        assert!(err.message.contains("WAS saved"));
        assert!(err.message.contains("P-1001"));
        assert!(err.message.contains("printed above"));
        assert_eq!(backend.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deliver_invoice_falls_back_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();

        let backend = FakeBackend::new(false);
        let mut session = BillingSession::new(backend, ClientConfig::default().shop);
        session
            .set_patient(PatientInfo {
                patient_id: "P-2002".into(),
                ..PatientInfo::default()
            })
            .unwrap();
        session.select_medicine("Paracetamol").await.unwrap();
        session.set_quantity(1);
        session.add_draft_line().unwrap();
        let completed = session.checkout().await.unwrap();

        let mut printed = Vec::new();
        let err = deliver_invoice(&blocker.join("x"), &completed, &mut printed).unwrap_err();
        let printed = String::from_utf8(printed).unwrap();

        assert!(printed.contains(&completed.document.to_text()));
        assert!(printed.contains("Paracetamol"));
        assert!(err.message.contains("P-2002"));

        let mut unused = Vec::new();
        let path = deliver_invoice(dir.path(), &completed, &mut unused).unwrap();
        assert!(path.ends_with("invoice-P-2002.txt"));
        assert!(unused.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_medicine() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path().to_path_buf(), false);
        args.items.push("Unobtainium=1".parse().unwrap());

        let err = bill(FakeBackend::new(false), &ClientConfig::default(), args)
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotFound);
    }
}
