//! # Catalog Commands

use pharmabill_client::{catalog, PharmacyBackend};
use tracing::debug;

use crate::error::CliError;
use crate::output;

/// Lists every medicine name, or the names matching `query` with prefix
/// matches first.
pub async fn medicines(backend: &dyn PharmacyBackend, query: Option<&str>) -> Result<(), CliError> {
    let names = match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => catalog::search(backend, q).await?,
        None => catalog::list(backend).await?,
    };
    debug!(count = names.len(), "Catalog names fetched");

    if names.is_empty() {
        println!("No medicines found.");
        return Ok(());
    }
    for name in &names {
        println!("{}", name);
    }
    Ok(())
}

pub async fn details(backend: &dyn PharmacyBackend, name: &str) -> Result<(), CliError> {
    let medicine = catalog::resolve(backend, name).await?;
    println!("{}", output::medicine_table(&medicine));
    Ok(())
}
