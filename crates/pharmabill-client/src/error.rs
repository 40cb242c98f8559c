//! # Client Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SessionError                                     │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Validation    │  │  LookupFailure  │  │  PersistenceFailure     │ │
//! │  │   (CoreError)   │  │ (BackendError)  │  │  (BackendError)         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │ bad quantity    │  │ catalog / sales │  │ POST /billing failed;   │ │
//! │  │ empty cart      │  │ fetch failed;   │  │ cart kept, no invoice   │ │
//! │  │ in-flight bill  │  │ cart untouched  │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │  LookupInFlight │  │  StaleLookup    │   Config(ConfigError)        │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable: the session stays usable after any of them.

use pharmabill_core::{CoreError, ValidationError};
use thiserror::Error;

pub type BackendResult<T> = Result<T, BackendError>;
pub type SessionResult<T> = Result<T, SessionError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Backend Errors
// =============================================================================

/// Failure talking to the pharmacy backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, reset, ...
    #[error("Cannot reach pharmacy backend at {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Request to {endpoint} timed out after {timeout_secs} seconds")]
    Timeout { endpoint: String, timeout_secs: u64 },

    /// Non-2xx response. `message` is the backend's `error`/`message` field
    /// when it sent one.
    #[error("Backend returned HTTP {status} for {endpoint}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("Medicine not found: {0}")]
    NotFound(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl From<url::ParseError> for BackendError {
    fn from(err: url::ParseError) -> Self {
        BackendError::InvalidUrl(err.to_string())
    }
}

impl BackendError {
    /// True for transient failures where trying again may succeed.
    ///
    /// ## Retryable Errors
    /// - Transport failures and timeouts
    /// - HTTP 5xx, 408 and 429
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport { .. } | BackendError::Timeout { .. } => true,
            BackendError::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            BackendError::Decode { .. }
            | BackendError::NotFound(_)
            | BackendError::InvalidUrl(_) => false,
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

impl From<url::ParseError> for ConfigError {
    fn from(err: url::ParseError) -> Self {
        ConfigError::InvalidUrl(err.to_string())
    }
}

// =============================================================================
// Session Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("Lookup failed: {0}")]
    LookupFailure(#[source] BackendError),

    #[error("Could not save the bill: {0}")]
    PersistenceFailure(#[source] BackendError),

    #[error("A lookup is already in progress")]
    LookupInFlight,

    /// Result of a lookup that was abandoned or superseded.
    #[error("Discarded stale lookup result (generation {generation})")]
    StaleLookup { generation: u64 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Validation(CoreError::Validation(err))
    }
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::LookupFailure(e) | SessionError::PersistenceFailure(e) => e.is_retryable(),
            SessionError::LookupInFlight => true,
            SessionError::Validation(CoreError::SubmissionInFlight) => true,
            _ => false,
        }
    }

    /// True when the user has to fix input before trying again.
    pub fn is_validation(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}
