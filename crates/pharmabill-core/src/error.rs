//! # Error Types
//!
//! Domain-specific error types for pharmabill-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pharmabill-core errors (this file)                                     │
//! │  ├── CoreError        - Cart / emitter rule violations                  │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  pharmabill-client errors (separate crate)                              │
//! │  ├── BackendError     - HTTP transport / status / decode failures       │
//! │  └── SessionError     - Validation | LookupFailure | PersistenceFailure │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SessionError → UI message          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal: every one resolves to an inline message and the
//! session stays interactive.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core billing errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart line index did not refer to an existing line.
    #[error("Cart line {index} does not exist (cart has {len} lines)")]
    LineIndexOutOfRange { index: usize, len: usize },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Checkout was requested on an empty cart.
    #[error("Cart is empty. Add items to the cart before generating a bill")]
    EmptyCart,

    /// A second submission was attempted while one is in flight.
    #[error("A bill submission is already in progress")]
    SubmissionInFlight,

    /// The cart cannot be edited while its submission is in flight.
    #[error("Cart is locked while the bill is being submitted")]
    CartLocked,

    /// A submission result arrived for an attempt that is no longer current
    /// (session abandoned or superseded).
    #[error("Submission attempt {attempt} is no longer current")]
    StaleSubmission { attempt: u64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These block the local operation and are shown inline; they are never
/// retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed number or date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
