//! # Billing Session
//!
//! One counter transaction from the first lookup to the printed invoice.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          BillingSession                                 │
//! │                                                                         │
//! │  select_medicine ──► begin_lookup ─► backend ─► finish_lookup ─► draft  │
//! │                                                                         │
//! │  draft ──► add_draft_line ──► Cart ◄── remove_line / edit_line          │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                  settlement() (discount, tendered, mode)                │
//! │                                 │                                       │
//! │  checkout ──► begin_checkout ─► POST /billing ─► finish_checkout        │
//! │                                                    │          │         │
//! │                                              2xx   ▼     fail ▼         │
//! │                           PersistedTransaction      cart kept,          │
//! │                           → InvoiceDocument,        emitter Failed      │
//! │                             cart cleared                                │
//! │                                                                         │
//! │  abandon() ──► generation += 1, in-flight results stale, cart discarded │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Async operations take `&mut self`, so a session never runs two at once.
//! The split `begin_*`/`finish_*` pairs are for callers that release the
//! session while a request is outstanding.

use std::sync::Arc;

use chrono::Utc;
use pharmabill_core::validation::validate_medicine_name;
use pharmabill_core::{
    Cart, CartLine, CoreError, DiscountRate, EmitterPhase, InvoiceDocument, InvoiceEmitter,
    LineDraft, MedicineRef, Money, PatientInfo, PaymentMode, PersistedTransaction, Settlement,
    SettlementInputs, ShopIdentity, SubmissionTicket, TransactionDraft,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{BillReceipt, PharmacyBackend};
use crate::catalog;
use crate::error::{BackendResult, SessionError, SessionResult};

/// Identifies one catalog lookup of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket {
    session_id: Uuid,
    generation: u64,
}

impl LookupTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A saved bill and its rendered invoice.
#[derive(Debug, Clone)]
pub struct CompletedBill {
    pub transaction: PersistedTransaction,
    pub document: InvoiceDocument,
}

pub struct BillingSession {
    id: Uuid,
    backend: Arc<dyn PharmacyBackend>,
    shop: ShopIdentity,
    cart: Cart,
    draft: LineDraft,
    patient: PatientInfo,
    inputs: SettlementInputs,
    emitter: InvoiceEmitter,
    generation: u64,
    lookup_in_flight: Option<u64>,
}

impl BillingSession {
    pub fn new(backend: Arc<dyn PharmacyBackend>, shop: ShopIdentity) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "Billing session started");
        Self {
            id,
            backend,
            shop,
            cart: Cart::new(),
            draft: LineDraft::new(),
            patient: PatientInfo::default(),
            inputs: SettlementInputs::default(),
            emitter: InvoiceEmitter::new(id),
            generation: 0,
            lookup_in_flight: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn draft(&self) -> &LineDraft {
        &self.draft
    }

    pub fn patient(&self) -> &PatientInfo {
        &self.patient
    }

    pub fn settlement_inputs(&self) -> &SettlementInputs {
        &self.inputs
    }

    pub fn phase(&self) -> EmitterPhase {
        self.emitter.phase()
    }

    /// Reason of the last failed submission, until the next edit.
    pub fn last_failure(&self) -> Option<&str> {
        self.emitter.failure_reason()
    }

    pub fn is_lookup_in_flight(&self) -> bool {
        self.lookup_in_flight.is_some()
    }

    /// Current settlement for the cart and counter inputs.
    pub fn settlement(&self) -> SessionResult<Settlement> {
        Ok(self.inputs.settle(self.cart.subtotal())?)
    }

    // =========================================================================
    // Draft & Patient Input
    // =========================================================================

    pub fn set_medicine_name(&mut self, name: impl Into<String>) {
        self.touch();
        self.draft.set_medicine_name(name);
    }

    pub fn set_quantity(&mut self, quantity: i64) {
        self.touch();
        self.draft.set_quantity(quantity);
    }

    pub fn set_price_override(&mut self, price: Option<Money>) {
        self.touch();
        self.draft.set_price_override(price);
    }

    pub fn clear_draft(&mut self) {
        self.touch();
        self.draft.clear();
    }

    pub fn set_patient(&mut self, patient: PatientInfo) -> SessionResult<()> {
        self.ensure_unlocked()?;
        self.touch();
        self.patient = patient;
        Ok(())
    }

    pub fn set_discount(&mut self, discount: DiscountRate) -> SessionResult<()> {
        self.ensure_unlocked()?;
        self.touch();
        self.inputs.discount = discount;
        Ok(())
    }

    pub fn set_amount_tendered(&mut self, amount: Option<Money>) -> SessionResult<()> {
        self.ensure_unlocked()?;
        self.touch();
        self.inputs.amount_tendered = amount;
        Ok(())
    }

    pub fn set_payment_mode(&mut self, mode: PaymentMode) -> SessionResult<()> {
        self.ensure_unlocked()?;
        self.touch();
        self.inputs.payment_mode = mode;
        Ok(())
    }

    // =========================================================================
    // Catalog Lookup
    // =========================================================================

    /// Medicine names matching `query`, best matches first.
    pub async fn search(&self, query: &str) -> SessionResult<Vec<String>> {
        catalog::search(self.backend.as_ref(), query).await
    }

    /// Sets the draft's medicine name and resolves it through the backend.
    ///
    /// On failure the draft keeps the typed name without resolved details and
    /// the cart is untouched.
    pub async fn select_medicine(&mut self, name: &str) -> SessionResult<&MedicineRef> {
        validate_medicine_name(name)?;
        self.set_medicine_name(name.trim());

        let ticket = self.begin_lookup()?;
        let result = self.backend.medicine_details(name.trim()).await;
        self.finish_lookup(ticket, result)
    }

    /// Marks a lookup as in flight. Rejected while another one is.
    pub fn begin_lookup(&mut self) -> SessionResult<LookupTicket> {
        if self.lookup_in_flight.is_some() {
            return Err(SessionError::LookupInFlight);
        }

        self.generation += 1;
        self.lookup_in_flight = Some(self.generation);
        Ok(LookupTicket {
            session_id: self.id,
            generation: self.generation,
        })
    }

    /// Applies a lookup result to the draft, unless the ticket is stale.
    pub fn finish_lookup(
        &mut self,
        ticket: LookupTicket,
        result: BackendResult<MedicineRef>,
    ) -> SessionResult<&MedicineRef> {
        if ticket.session_id != self.id || self.lookup_in_flight != Some(ticket.generation) {
            debug!(session = %self.id, generation = ticket.generation, "Discarding stale lookup result");
            return Err(SessionError::StaleLookup {
                generation: ticket.generation,
            });
        }
        self.lookup_in_flight = None;

        match result {
            Ok(medicine) => {
                debug!(medicine = %medicine.name, mrp = %medicine.mrp, "Medicine resolved");
                self.draft.apply_medicine(medicine);
                self.draft
                    .medicine()
                    .ok_or(SessionError::StaleLookup {
                        generation: ticket.generation,
                    })
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "Medicine lookup failed");
                Err(SessionError::LookupFailure(e))
            }
        }
    }

    // =========================================================================
    // Cart Editing
    // =========================================================================

    /// Validates the draft and appends it to the cart; clears the draft.
    pub fn add_draft_line(&mut self) -> SessionResult<()> {
        self.ensure_unlocked()?;
        self.touch();

        let line = self.draft.build()?;
        debug!(medicine = %line.medicine_name(), qty = line.quantity(), amount = %line.line_amount(), "Adding line");
        self.cart.push(line)?;
        self.draft.clear();
        Ok(())
    }

    /// Adds a line directly from a resolved medicine.
    pub fn add_line(
        &mut self,
        medicine: &MedicineRef,
        quantity: i64,
        price_override: Option<Money>,
    ) -> SessionResult<&CartLine> {
        self.ensure_unlocked()?;
        self.touch();
        Ok(self.cart.add_line(medicine, quantity, price_override)?)
    }

    pub fn remove_line(&mut self, index: usize) -> SessionResult<CartLine> {
        self.ensure_unlocked()?;
        self.touch();
        Ok(self.cart.remove_line(index)?)
    }

    /// Moves a line back into the draft for editing.
    pub fn edit_line(&mut self, index: usize) -> SessionResult<&LineDraft> {
        self.ensure_unlocked()?;
        self.touch();
        self.draft = self.cart.edit_line(index)?;
        Ok(&self.draft)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submits the bill and, once the backend confirms it, renders the
    /// invoice and starts a fresh cart.
    pub async fn checkout(&mut self) -> SessionResult<CompletedBill> {
        let (ticket, draft) = self.begin_checkout()?;
        let result = self.backend.submit_bill(&draft).await;
        self.finish_checkout(ticket, result)
    }

    /// Snapshots the bill and locks the cart.
    pub fn begin_checkout(&mut self) -> SessionResult<(SubmissionTicket, TransactionDraft)> {
        if self.emitter.is_submitting() {
            return Err(CoreError::SubmissionInFlight.into());
        }

        let settlement = self.settlement()?;
        let draft = TransactionDraft::new(&self.patient, &self.cart, settlement)?;
        let ticket = self.emitter.begin(draft.clone())?;

        info!(
            session = %self.id,
            attempt = ticket.attempt(),
            lines = draft.lines.len(),
            total = %settlement.discounted_total,
            "Submitting bill"
        );
        Ok((ticket, draft))
    }

    /// Applies the backend's answer for `ticket`.
    ///
    /// Success clears the cart and yields the invoice. Failure leaves the cart
    /// exactly as it was and produces no document.
    pub fn finish_checkout(
        &mut self,
        ticket: SubmissionTicket,
        result: BackendResult<BillReceipt>,
    ) -> SessionResult<CompletedBill> {
        match result {
            Ok(receipt) => {
                let transaction = self
                    .emitter
                    .confirm_persisted(ticket, Utc::now(), receipt.message)?;
                let document = InvoiceDocument::render(&self.shop, &transaction);

                info!(
                    session = %self.id,
                    patient_id = %transaction.patient().patient_id,
                    pages = document.page_count(),
                    "Bill saved"
                );

                self.cart.clear();
                self.draft.clear();
                self.patient = PatientInfo::default();
                self.inputs = SettlementInputs::default();
                self.emitter.acknowledge();

                Ok(CompletedBill {
                    transaction,
                    document,
                })
            }
            Err(e) => {
                self.emitter.mark_failed(ticket, e.to_string())?;
                warn!(session = %self.id, attempt = ticket.attempt(), error = %e, "Bill submission failed");
                Err(SessionError::PersistenceFailure(e))
            }
        }
    }

    /// Navigating away: in-flight lookups and submissions become stale and
    /// the cart, draft, patient and settlement inputs are discarded.
    pub fn abandon(&mut self) {
        if self.lookup_in_flight.is_some() || self.emitter.is_submitting() {
            debug!(session = %self.id, "Abandoning in-flight work");
        }
        self.generation += 1;
        self.lookup_in_flight = None;
        self.emitter.abandon();

        if !self.cart.is_empty() {
            info!(session = %self.id, lines = self.cart.line_count(), "Discarding cart");
        }
        self.cart.clear();
        self.draft.clear();
        self.patient = PatientInfo::default();
        self.inputs = SettlementInputs::default();
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn ensure_unlocked(&self) -> SessionResult<()> {
        if self.emitter.is_submitting() {
            return Err(CoreError::CartLocked.into());
        }
        Ok(())
    }

    /// Any user edit acknowledges a failed submission.
    fn touch(&mut self) {
        if self.emitter.phase() == EmitterPhase::Failed {
            self.emitter.acknowledge();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockPharmacyBackend;
    use crate::error::BackendError;
    use chrono::NaiveDate;
    use pharmabill_core::ValidationError;

    fn medicine(name: &str, paise: i64) -> MedicineRef {
        MedicineRef {
            name: name.to_string(),
            mrp: Money::from_paise(paise),
            batch_no: format!("{}-B1", &name[..3]),
            expiry_date: NaiveDate::from_ymd_opt(2027, 6, 30).unwrap(),
        }
    }

    fn session(backend: MockPharmacyBackend) -> BillingSession {
        BillingSession::new(Arc::new(backend), ShopIdentity::default())
    }

    fn patient() -> PatientInfo {
        PatientInfo {
            patient_id: "P-1001".to_string(),
            patient_name: "Asha Rao".to_string(),
            patient_phone: "9876543210".to_string(),
        }
    }

    /// Cart of 2 × Paracetamol @ 10.50 and 1 × Cough Syrup @ 44.50 = 65.50.
    fn filled(backend: MockPharmacyBackend) -> BillingSession {
        let mut s = session(backend);
        s.add_line(&medicine("Paracetamol", 1050), 2, None).unwrap();
        s.add_line(&medicine("Cough Syrup", 4450), 1, None).unwrap();
        s.set_patient(patient()).unwrap();
        s
    }

    #[tokio::test]
    async fn test_select_medicine_fills_draft() {
        let mut backend = MockPharmacyBackend::new();
        backend
            .expect_medicine_details()
            .once()
            .returning(|name| Ok(medicine(name, 1050)));

        let mut s = session(backend);
        let resolved = s.select_medicine("Paracetamol").await.unwrap().clone();
        assert_eq!(resolved.mrp, Money::from_paise(1050));

        s.set_quantity(3);
        s.add_draft_line().unwrap();
        assert_eq!(s.cart().subtotal(), Money::from_paise(3150));
        assert_eq!(s.draft(), &LineDraft::default());
    }

    #[tokio::test]
    async fn test_lookup_failure_leaves_cart_and_draft_details_untouched() {
        let mut backend = MockPharmacyBackend::new();
        backend.expect_medicine_details().returning(|_| {
            Err(BackendError::Timeout {
                endpoint: "/medicine_details".into(),
                timeout_secs: 5,
            })
        });

        let mut s = filled(backend);
        let err = s.select_medicine("Ibuprofen").await.unwrap_err();

        assert!(matches!(err, SessionError::LookupFailure(BackendError::Timeout { .. })));
        assert!(err.is_retryable());
        assert_eq!(s.cart().line_count(), 2);
        assert_eq!(s.draft().medicine_name(), "Ibuprofen");
        assert!(s.draft().medicine().is_none());
        assert!(!s.is_lookup_in_flight());
    }

    #[test]
    fn test_second_lookup_rejected_and_abandoned_result_discarded() {
        let mut s = session(MockPharmacyBackend::new());
        s.set_medicine_name("Cough Syrup");

        let ticket = s.begin_lookup().unwrap();
        assert!(matches!(s.begin_lookup(), Err(SessionError::LookupInFlight)));

        s.abandon();
        let late = s.finish_lookup(ticket, Ok(medicine("Cough Syrup", 4450)));
        assert!(matches!(late, Err(SessionError::StaleLookup { .. })));
        assert!(s.draft().medicine().is_none());

        // a fresh lookup after abandoning works
        let fresh = s.begin_lookup().unwrap();
        assert!(fresh.generation() > ticket.generation());
        assert!(s.finish_lookup(fresh, Ok(medicine("Cough Syrup", 4450))).is_ok());
    }

    #[test]
    fn test_invalid_add_leaves_cart_unchanged() {
        let mut s = filled(MockPharmacyBackend::new());

        let err = s.add_line(&medicine("Zinc Tablets", 500), 0, None).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));

        // draft without resolved medicine
        s.set_medicine_name("Zinc Tablets");
        s.set_quantity(1);
        assert!(s.add_draft_line().is_err());

        assert_eq!(s.cart().line_count(), 2);
        assert_eq!(s.cart().subtotal(), Money::from_paise(6550));
    }

    #[test]
    fn test_edit_line_moves_line_into_draft() {
        let mut s = filled(MockPharmacyBackend::new());

        let draft = s.edit_line(1).unwrap().clone();
        assert_eq!(draft.medicine_name(), "Cough Syrup");
        assert_eq!(draft.quantity(), Some(1));
        assert_eq!(s.cart().line_count(), 1);

        s.set_quantity(2);
        s.add_draft_line().unwrap();
        assert_eq!(s.cart().subtotal(), Money::from_paise(2100 + 8900));

        assert!(matches!(
            s.remove_line(5),
            Err(SessionError::Validation(CoreError::LineIndexOutOfRange { index: 5, len: 2 }))
        ));
    }

    #[test]
    fn test_settlement_scenario() {
        let mut s = filled(MockPharmacyBackend::new());
        s.set_discount(DiscountRate::from_percent(10)).unwrap();
        s.set_amount_tendered(Some(Money::from_rupees(60))).unwrap();

        let settlement = s.settlement().unwrap();
        assert_eq!(settlement.subtotal, Money::from_paise(6550));
        assert_eq!(settlement.discount_amount, Money::from_paise(655));
        assert_eq!(settlement.discounted_total, Money::from_paise(5895));
        assert_eq!(settlement.rounded_total, 59);
        assert_eq!(settlement.change, Some(Money::from_paise(105)));
    }

    #[tokio::test]
    async fn test_checkout_success_renders_invoice_and_clears_cart() {
        let mut backend = MockPharmacyBackend::new();
        backend
            .expect_submit_bill()
            .once()
            .withf(|draft| draft.lines.len() == 2 && draft.patient.patient_id == "P-1001")
            .returning(|_| {
                Ok(BillReceipt {
                    message: Some("Bill generated successfully!".to_string()),
                })
            });

        let mut s = filled(backend);
        s.set_discount(DiscountRate::from_percent(10)).unwrap();
        s.set_amount_tendered(Some(Money::from_rupees(60))).unwrap();

        let bill = s.checkout().await.unwrap();

        assert_eq!(bill.transaction.settlement().discounted_total, Money::from_paise(5895));
        assert_eq!(bill.document.file_name(), "invoice-P-1001.txt");
        assert!(bill.document.to_text().contains("₹58.95"));

        assert!(s.cart().is_empty());
        assert_eq!(s.patient(), &PatientInfo::default());
        assert_eq!(s.settlement_inputs(), &SettlementInputs::default());
        assert_eq!(s.phase(), EmitterPhase::Idle);
    }

    #[tokio::test]
    async fn test_checkout_failure_keeps_cart_and_produces_no_invoice() {
        let mut backend = MockPharmacyBackend::new();
        backend.expect_submit_bill().once().returning(|_| {
            Err(BackendError::Status {
                endpoint: "/billing".into(),
                status: 500,
                message: "Internal Server Error".into(),
            })
        });

        let mut s = filled(backend);
        let before = s.cart().clone();

        let err = s.checkout().await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::PersistenceFailure(BackendError::Status { status: 500, .. })
        ));
        assert_eq!(s.cart(), &before);
        assert_eq!(s.cart().line_count(), 2);
        assert_eq!(s.phase(), EmitterPhase::Failed);
        assert!(s.last_failure().is_some_and(|r| r.contains("500")));

        // the next edit returns the session to idle
        s.set_payment_mode(PaymentMode::Online).unwrap();
        assert_eq!(s.phase(), EmitterPhase::Idle);
    }

    #[test]
    fn test_checkout_requires_patient_and_lines() {
        let mut s = session(MockPharmacyBackend::new());
        s.set_patient(patient()).unwrap();
        assert!(matches!(
            s.begin_checkout(),
            Err(SessionError::Validation(CoreError::EmptyCart))
        ));

        let mut s = filled(MockPharmacyBackend::new());
        s.set_patient(PatientInfo::default()).unwrap();
        assert!(s.begin_checkout().is_err());
        assert_eq!(s.phase(), EmitterPhase::Idle);
    }

    #[test]
    fn test_double_submit_rejected_and_cart_locked() {
        let mut s = filled(MockPharmacyBackend::new());
        let (ticket, _draft) = s.begin_checkout().unwrap();

        assert!(matches!(
            s.begin_checkout(),
            Err(SessionError::Validation(CoreError::SubmissionInFlight))
        ));
        assert!(matches!(
            s.remove_line(0),
            Err(SessionError::Validation(CoreError::CartLocked))
        ));
        assert!(s.set_discount(DiscountRate::from_percent(5)).is_err());

        assert!(s.finish_checkout(ticket, Ok(BillReceipt::default())).is_ok());
    }

    #[test]
    fn test_result_after_abandon_is_discarded() {
        let mut s = filled(MockPharmacyBackend::new());
        let (ticket, _draft) = s.begin_checkout().unwrap();

        s.abandon();
        let late = s.finish_checkout(ticket, Ok(BillReceipt::default()));

        assert!(matches!(
            late,
            Err(SessionError::Validation(CoreError::StaleSubmission { .. }))
        ));
        // navigating away discarded the bill; the late result did not revive it
        assert!(s.cart().is_empty());
        assert_eq!(s.cart().subtotal(), Money::zero());
        assert!(s.patient().patient_id.is_empty());
        assert_eq!(s.settlement_inputs(), &SettlementInputs::default());
        assert_eq!(s.phase(), EmitterPhase::Idle);

        // the same cart cannot be checked out again
        assert!(matches!(
            s.begin_checkout(),
            Err(SessionError::Validation(_))
        ));
    }

    #[test]
    fn test_abandon_discards_cart_and_patient() {
        let mut s = session(MockPharmacyBackend::new());
        s.add_line(&medicine("Paracetamol", 1250), 2, None).unwrap();
        s.set_patient(patient()).unwrap();
        s.set_discount(DiscountRate::from_percent(10)).unwrap();
        s.set_medicine_name("Cough Syrup");

        s.abandon();

        assert!(s.cart().is_empty());
        assert!(s.patient().patient_id.is_empty());
        assert_eq!(s.draft().medicine_name(), "");
        assert_eq!(s.settlement_inputs().discount, DiscountRate::from_percent(0));
        assert_eq!(s.settlement().unwrap().discounted_total, Money::zero());
    }
}
