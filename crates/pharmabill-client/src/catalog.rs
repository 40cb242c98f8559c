//! # Catalog Lookup
//!
//! Read-only medicine search and resolution.
//!
//! ```text
//! query "para" ─► GET /medicines ─► rank_matches ─► ["PARACETAMOL 500",   prefix
//!                                                    "PARAFFIN LIQUID",   prefix
//!                                                    "ANTI-PARASITE"]     substring
//! ```

use pharmabill_core::validation::{validate_medicine_name, validate_search_query};
use pharmabill_core::MedicineRef;
use tracing::{debug, warn};

use crate::backend::PharmacyBackend;
use crate::error::{SessionError, SessionResult};

/// Case-insensitive matches of `query` in `names`: prefix matches first, then
/// other substring matches, each group in catalog order. Duplicates are
/// dropped.
///
/// ```rust
/// use pharmabill_client::catalog::rank_matches;
///
/// let names = vec!["Antacid".to_string(), "Paracetamol".to_string(), "Anti-Parasite".to_string()];
/// assert_eq!(rank_matches(&names, "PARA"), vec!["Paracetamol", "Anti-Parasite"]);
/// ```
pub fn rank_matches(names: &[String], query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut prefix = Vec::new();
    let mut substring = Vec::new();
    for name in names {
        if prefix.contains(name) || substring.contains(name) {
            continue;
        }
        let haystack = name.to_lowercase();
        if haystack.starts_with(&needle) {
            prefix.push(name.clone());
        } else if haystack.contains(&needle) {
            substring.push(name.clone());
        }
    }

    prefix.extend(substring);
    prefix
}

/// Searches the catalog for medicine names matching `query`.
pub async fn search(backend: &dyn PharmacyBackend, query: &str) -> SessionResult<Vec<String>> {
    let query = validate_search_query(query)?;

    let names = backend.list_medicines().await.map_err(|e| {
        warn!(error = %e, "Medicine list fetch failed");
        SessionError::LookupFailure(e)
    })?;

    let matches = rank_matches(&names, &query);
    debug!(query = %query, catalog = names.len(), matches = matches.len(), "Catalog search");
    Ok(matches)
}

/// Full catalog listing.
pub async fn list(backend: &dyn PharmacyBackend) -> SessionResult<Vec<String>> {
    backend
        .list_medicines()
        .await
        .map_err(SessionError::LookupFailure)
}

/// Resolves an exact medicine name to its price, batch and expiry.
pub async fn resolve(backend: &dyn PharmacyBackend, name: &str) -> SessionResult<MedicineRef> {
    validate_medicine_name(name)?;
    let name = name.trim();

    backend.medicine_details(name).await.map_err(|e| {
        warn!(medicine = %name, error = %e, "Medicine details fetch failed");
        SessionError::LookupFailure(e)
    })
}
