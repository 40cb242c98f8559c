//! # pharmabill-core: Pure Billing Logic for PharmaBill
//!
//! This crate holds the cart, settlement arithmetic, the invoice emitter state
//! machine and the invoice renderer as pure functions and types with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PharmaBill Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Counter CLI (apps/counter)                      │   │
//! │  │    medicines ──► details ──► bill ──► invoice file / sales      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            pharmabill-client (session + HTTP backend)           │   │
//! │  │    BillingSession, PharmacyBackend, ClientConfig               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ pharmabill-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌───────────────┐   │   │
//! │  │   │  money   │ │   cart   │ │ settlement │ │emitter/invoice│   │   │
//! │  │   │  Money   │ │   Cart   │ │ Settlement │ │ Persisted-    │   │   │
//! │  │   │ Discount │ │ CartLine │ │  change    │ │ Transaction   │   │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └───────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO FILES • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (MedicineRef, DiscountRate, PaymentMode, ...)
//! - [`money`] - Money in integer paise
//! - [`cart`] - Cart, cart lines and the line draft
//! - [`settlement`] - Discount, rounding and change
//! - [`emitter`] - Submission state machine guarding invoice output
//! - [`invoice`] - Paged text invoice rendering
//! - [`sales`] - Sales report aggregation
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use pharmabill_core::{Cart, DiscountRate, MedicineRef, Money, PaymentMode, Settlement};
//!
//! let paracetamol = MedicineRef {
//!     name: "Paracetamol".to_string(),
//!     mrp: Money::from_paise(1050),
//!     batch_no: "PCM-22".to_string(),
//!     expiry_date: NaiveDate::from_ymd_opt(2027, 6, 30).unwrap(),
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_line(&paracetamol, 2, None).unwrap();
//! assert_eq!(cart.subtotal().paise(), 2100);
//!
//! let s = Settlement::compute(cart.subtotal(), DiscountRate::from_percent(10), None, PaymentMode::Cash)
//!     .unwrap();
//! assert_eq!(s.discounted_total.paise(), 1890);
//! assert_eq!(s.rounded_total, 19);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod emitter;
pub mod error;
pub mod invoice;
pub mod money;
pub mod sales;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals, LineDraft};
pub use emitter::{EmitterPhase, InvoiceEmitter, PersistedTransaction, SubmissionTicket, TransactionDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::InvoiceDocument;
pub use money::Money;
pub use sales::{MedicineSales, SaleRecord, SalesQuery, SalesSummary, SoldItem};
pub use settlement::{Settlement, SettlementInputs};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on one cart line.
///
/// Catches typing 1000 instead of 10.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Highest unit price accepted on a cart line: ₹10,00,000.
///
/// Keeps `unit_price × MAX_LINE_QUANTITY × MAX_CART_LINES` far inside `i64`.
pub const MAX_UNIT_PRICE_PAISE: i64 = 100_000_000;

/// 100% expressed in basis points.
pub const MAX_DISCOUNT_BPS: u32 = 10_000;
