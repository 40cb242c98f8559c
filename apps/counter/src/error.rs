//! # CLI Error Type
//!
//! Every failure ends the command with one message line and an exit code.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SessionError::Validation        ──► VALIDATION_ERROR      exit 2       │
//! │  SessionError::LookupFailure     ──► LOOKUP_FAILED         exit 3       │
//! │  SessionError::PersistenceFailure──► PERSISTENCE_FAILED    exit 4       │
//! │  ConfigError                     ──► CONFIG_ERROR          exit 5       │
//! │  io::Error                       ──► IO_ERROR              exit 6       │
//! │  saved bill, invoice file failed ──► INVOICE_NOT_WRITTEN   exit 7       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use pharmabill_client::{BackendError, ConfigError, SessionError};
use pharmabill_core::{CoreError, ValidationError};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Whether running the same command again may succeed
    pub retryable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    LookupFailed,
    PersistenceFailed,
    ConfigError,
    IoError,
    /// The bill was persisted but its invoice file could not be written.
    InvoiceNotWritten,
}

impl ErrorCode {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound | ErrorCode::LookupFailed => 3,
            ErrorCode::PersistenceFailed => 4,
            ErrorCode::ConfigError => 5,
            ErrorCode::IoError => 6,
            ErrorCode::InvoiceNotWritten => 7,
        }
    }
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    /// The backend saved the bill; only the invoice file is missing.
    /// Re-running the command would bill the patient again.
    pub fn invoice_not_written(
        patient_id: &str,
        dir: &std::path::Path,
        err: &std::io::Error,
        printed: bool,
    ) -> Self {
        let where_now = if printed {
            "The invoice was printed above; save or print it from there."
        } else {
            "The invoice text could not be shown either."
        };
        CliError::new(
            ErrorCode::InvoiceNotWritten,
            format!(
                "Bill for patient {} WAS saved, but the invoice could not be written to {}: {}. {} Do not bill again.",
                patient_id,
                dir.display(),
                err,
                where_now
            ),
        )
    }

    fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code.exit_code())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        let retryable = err.is_retryable();
        match err {
            SessionError::LookupFailure(BackendError::NotFound(name)) => {
                CliError::new(ErrorCode::NotFound, format!("Medicine not found: {}", name))
            }
            SessionError::LookupFailure(e) => {
                CliError::new(ErrorCode::LookupFailed, format!("Lookup failed: {}", e))
            }
            SessionError::PersistenceFailure(e) => CliError::new(
                ErrorCode::PersistenceFailed,
                format!("Bill was NOT saved and no invoice was written: {}", e),
            ),
            SessionError::Config(e) => e.into(),
            other => CliError::validation(other.to_string()),
        }
        .retryable(retryable)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        SessionError::from(err).into()
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::IoError, format!("I/O error: {}", err))
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}
