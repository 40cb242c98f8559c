//! # Invoice Emitter State Machine
//!
//! Guards the persist-before-emit rule: an invoice may only be rendered from a
//! [`PersistedTransaction`], and the only way to obtain one is a successful
//! [`InvoiceEmitter::confirm_persisted`] for the current submission.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            begin(draft)                confirm_persisted(ticket)        │
//! │   ┌──────┐ ───────────► ┌────────────┐ ───────────────► ┌───────────┐   │
//! │   │ Idle │              │ Submitting │                  │ Persisted │   │
//! │   └──────┘ ◄─┐          └────────────┘ ───────────────► └───────────┘   │
//! │      ▲       │                │         mark_failed(ticket)    │        │
//! │      │       │                ▼                                │        │
//! │      │       │          ┌──────────┐                           │        │
//! │      │       └───────── │  Failed  │      acknowledge()        │        │
//! │      │   acknowledge()  └──────────┘                           │        │
//! │      └─────────────────────────────────────────────────────────┘        │
//! │                                                                         │
//! │  begin() while Submitting ──► CoreError::SubmissionInFlight            │
//! │  result for an old ticket  ──► CoreError::StaleSubmission              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::{Cart, CartLine};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::settlement::Settlement;
use crate::types::PatientInfo;
use crate::validation::{validate_patient_id, validate_phone};

// =============================================================================
// Transaction Snapshots
// =============================================================================

/// Everything that is sent to the backend, frozen when submission starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionDraft {
    pub patient: PatientInfo,
    pub lines: Vec<CartLine>,
    pub settlement: Settlement,
}

impl TransactionDraft {
    /// Snapshots the cart for submission.
    ///
    /// Requires a non-empty cart and a patient id; the phone, if given,
    /// must look like a phone number. The settlement must have been computed
    /// from this cart's subtotal.
    pub fn new(patient: &PatientInfo, cart: &Cart, settlement: Settlement) -> CoreResult<Self> {
        validate_patient_id(&patient.patient_id)?;
        validate_phone(&patient.patient_phone)?;

        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if settlement.subtotal != cart.subtotal() {
            return Err(CoreError::Validation(ValidationError::InvalidFormat {
                field: "settlement".to_string(),
                reason: "settlement does not match the cart subtotal".to_string(),
            }));
        }

        Ok(TransactionDraft {
            patient: PatientInfo {
                patient_id: patient.patient_id.trim().to_string(),
                patient_name: patient.patient_name.trim().to_string(),
                patient_phone: patient.patient_phone.trim().to_string(),
            },
            lines: cart.lines().to_vec(),
            settlement,
        })
    }
}

/// A transaction the backend has acknowledged.
///
/// No public constructor: only the emitter creates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PersistedTransaction {
    draft: TransactionDraft,
    #[ts(as = "String")]
    persisted_at: DateTime<Utc>,
    backend_message: Option<String>,
}

impl PersistedTransaction {
    pub fn patient(&self) -> &PatientInfo {
        &self.draft.patient
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.draft.lines
    }

    pub fn settlement(&self) -> &Settlement {
        &self.draft.settlement
    }

    pub fn persisted_at(&self) -> DateTime<Utc> {
        self.persisted_at
    }

    pub fn backend_message(&self) -> Option<&str> {
        self.backend_message.as_deref()
    }
}

// =============================================================================
// Tickets
// =============================================================================

/// Identifies one submission attempt of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionTicket {
    session_id: Uuid,
    attempt: u64,
}

impl SubmissionTicket {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }
}

// =============================================================================
// Emitter
// =============================================================================

/// Observable phase of the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub enum EmitterPhase {
    Idle,
    Submitting,
    Persisted,
    Failed,
}

#[derive(Debug, Clone)]
enum EmitterState {
    Idle,
    Submitting {
        ticket: SubmissionTicket,
        draft: TransactionDraft,
    },
    Persisted {
        transaction: PersistedTransaction,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct InvoiceEmitter {
    session_id: Uuid,
    next_attempt: u64,
    state: EmitterState,
}

impl InvoiceEmitter {
    pub fn new(session_id: Uuid) -> Self {
        InvoiceEmitter {
            session_id,
            next_attempt: 1,
            state: EmitterState::Idle,
        }
    }

    pub fn phase(&self) -> EmitterPhase {
        match self.state {
            EmitterState::Idle => EmitterPhase::Idle,
            EmitterState::Submitting { .. } => EmitterPhase::Submitting,
            EmitterState::Persisted { .. } => EmitterPhase::Persisted,
            EmitterState::Failed { .. } => EmitterPhase::Failed,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, EmitterState::Submitting { .. })
    }

    /// The draft currently being submitted.
    pub fn pending(&self) -> Option<&TransactionDraft> {
        match &self.state {
            EmitterState::Submitting { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            EmitterState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    pub fn persisted(&self) -> Option<&PersistedTransaction> {
        match &self.state {
            EmitterState::Persisted { transaction } => Some(transaction),
            _ => None,
        }
    }

    /// `Idle | Failed | Persisted → Submitting`.
    pub fn begin(&mut self, draft: TransactionDraft) -> CoreResult<SubmissionTicket> {
        if self.is_submitting() {
            return Err(CoreError::SubmissionInFlight);
        }

        let ticket = SubmissionTicket {
            session_id: self.session_id,
            attempt: self.next_attempt,
        };
        self.next_attempt += 1;
        self.state = EmitterState::Submitting { ticket, draft };
        Ok(ticket)
    }

    /// `Submitting → Persisted` for the current ticket only.
    pub fn confirm_persisted(
        &mut self,
        ticket: SubmissionTicket,
        persisted_at: DateTime<Utc>,
        backend_message: Option<String>,
    ) -> CoreResult<PersistedTransaction> {
        let draft = self.take_pending(ticket)?;
        let transaction = PersistedTransaction {
            draft,
            persisted_at,
            backend_message,
        };
        self.state = EmitterState::Persisted {
            transaction: transaction.clone(),
        };
        Ok(transaction)
    }

    /// `Submitting → Failed` for the current ticket only.
    pub fn mark_failed(&mut self, ticket: SubmissionTicket, reason: impl Into<String>) -> CoreResult<()> {
        self.take_pending(ticket)?;
        self.state = EmitterState::Failed {
            reason: reason.into(),
        };
        Ok(())
    }

    /// `Persisted | Failed → Idle`. No effect while idle or submitting.
    pub fn acknowledge(&mut self) {
        if matches!(
            self.state,
            EmitterState::Persisted { .. } | EmitterState::Failed { .. }
        ) {
            self.state = EmitterState::Idle;
        }
    }

    /// Drops any in-flight submission; its ticket becomes stale.
    pub fn abandon(&mut self) {
        self.state = EmitterState::Idle;
    }

    fn take_pending(&mut self, ticket: SubmissionTicket) -> CoreResult<TransactionDraft> {
        match &self.state {
            EmitterState::Submitting { ticket: current, .. }
                if *current == ticket && ticket.session_id == self.session_id => {}
            _ => {
                return Err(CoreError::StaleSubmission {
                    attempt: ticket.attempt,
                })
            }
        }

        match std::mem::replace(&mut self.state, EmitterState::Idle) {
            EmitterState::Submitting { draft, .. } => Ok(draft),
            // checked above
            other => {
                self.state = other;
                Err(CoreError::StaleSubmission {
                    attempt: ticket.attempt,
                })
            }
        }
    }
}
