//! # pharmabill-client: Backend Access and Billing Session
//!
//! Connects the pure `pharmabill-core` logic to the pharmacy REST backend.
//!
//! ## Modules
//!
//! - [`session`] - [`BillingSession`]: cart, lookups and checkout for one counter transaction
//! - [`backend`] - [`PharmacyBackend`] trait, the only path to the backend
//! - [`http`] - `reqwest` implementation with per-request timeouts
//! - [`wire`] - JSON request/response shapes
//! - [`catalog`] - medicine search ranking and resolution
//! - [`reports`] - sales report summaries
//! - [`config`] - [`ClientConfig`] (env > TOML > defaults)
//! - [`error`] - [`BackendError`], [`SessionError`], [`ConfigError`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pharmabill_client::{BillingSession, ClientConfig, HttpBackend};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load(None)?;
//! let backend = Arc::new(HttpBackend::from_config(&config)?);
//! let mut session = BillingSession::new(backend, config.shop.clone());
//!
//! session.select_medicine("PARACETAMOL").await?;
//! session.set_quantity(2);
//! session.add_draft_line()?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod reports;
pub mod session;
pub mod wire;

pub use backend::{BillReceipt, PharmacyBackend, SalesReport};
pub use config::ClientConfig;
pub use error::{BackendError, BackendResult, ConfigError, ConfigResult, SessionError, SessionResult};
pub use http::HttpBackend;
pub use session::{BillingSession, CompletedBill, LookupTicket};
