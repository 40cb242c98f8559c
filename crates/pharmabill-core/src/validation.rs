//! # Validation Module
//!
//! Input validation utilities for PharmaBill.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form / CLI input                                              │
//! │  └── Typed builders (LineDraft, BillingSession setters)                 │
//! │           │  no checks per keystroke                                    │
//! │           ▼                                                             │
//! │  Layer 2: Submission (THIS MODULE)                                      │
//! │  └── Field rules checked when a line is added or a bill is submitted    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Pharmacy backend                                              │
//! │  └── Stock availability, medicine existence                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY, MAX_UNIT_PRICE_PAISE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a medicine name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most 200 characters
///
/// ```rust
/// use pharmabill_core::validation::validate_medicine_name;
///
/// assert!(validate_medicine_name("Paracetamol 500mg").is_ok());
/// assert!(validate_medicine_name("  ").is_err());
/// ```
pub fn validate_medicine_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "medicine_name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "medicine_name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates the patient identifier required on every bill.
pub fn validate_patient_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "patient_id".to_string(),
        });
    }

    if id.chars().count() > 64 {
        return Err(ValidationError::TooLong {
            field: "patient_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates an optional patient phone number.
///
/// Empty is allowed. Otherwise digits with an optional leading `+` and
/// spaces or hyphens as separators, 7 to 15 digits in total.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Ok(());
    }

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "patient_phone".to_string(),
            reason: "must contain only digits, spaces and hyphens".to_string(),
        });
    }

    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "patient_phone".to_string(),
            reason: "must have between 7 and 15 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query for the medicine autocomplete.
///
/// Returns the trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.is_empty() {
        return Err(ValidationError::Required {
            field: "query".to_string(),
        });
    }

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free samples).
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.paise() > MAX_UNIT_PRICE_PAISE {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_PAISE,
        });
    }

    Ok(())
}

/// Validates the amount the patient handed over.
pub fn validate_tendered(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "amount_tendered".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
