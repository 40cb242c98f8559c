//! # PharmaBill Counter Entry Point
//!
//! ```text
//! pharmabill [--config PATH] [--api-url URL] <COMMAND>
//!
//!   medicines [QUERY]        list or search the catalog
//!   details <NAME>           price, batch and expiry of one medicine
//!   bill ...                 build a cart, save the bill, write the invoice
//!   sales --from --to        sales report for a date range
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // The actual setup is in lib.rs for testability
    pharmabill_counter::run().await
}
