//! # Pharmacy Backend Boundary
//!
//! The session talks to the backend only through [`PharmacyBackend`], so tests
//! can substitute a mock and the HTTP details stay in [`crate::http`].

use async_trait::async_trait;
use pharmabill_core::{MedicineRef, Money, SaleRecord, SalesQuery, TransactionDraft};

use crate::error::BackendResult;

/// Backend acknowledgement of a saved bill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillReceipt {
    pub message: Option<String>,
}

/// Sales records for a date range, plus the backend's own earnings total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesReport {
    pub records: Vec<SaleRecord>,
    pub reported_earnings: Money,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PharmacyBackend: Send + Sync {
    /// All medicine names in catalog order.
    async fn list_medicines(&self) -> BackendResult<Vec<String>>;

    /// Price, batch and expiry of one medicine by exact name.
    async fn medicine_details(&self, name: &str) -> BackendResult<MedicineRef>;

    /// Persists a bill. Only a successful return counts as persisted.
    async fn submit_bill(&self, draft: &TransactionDraft) -> BackendResult<BillReceipt>;

    async fn sales(&self, query: &SalesQuery) -> BackendResult<SalesReport>;
}
