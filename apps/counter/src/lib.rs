//! # PharmaBill Counter Library
//!
//! Command-line front end for the pharmacy counter.
//!
//! ## Module Organization
//! ```text
//! pharmabill_counter/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! ├── cli.rs          ◄─── clap definitions and argument parsers
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── catalog.rs  ◄─── medicines / details
//! │   ├── bill.rs     ◄─── cart → settlement → checkout → invoice file
//! │   └── sales.rs    ◄─── sales report
//! ├── output.rs       ◄─── tables and invoice file writing
//! └── error.rs        ◄─── CliError and exit codes
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pharmabill_client::{ClientConfig, HttpBackend};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use error::CliError;

/// Runs the CLI and returns the process exit code.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Parse arguments (clap exits on --help / usage errors)               │
/// │  2. Initialize logging (RUST_LOG, default info)                         │
/// │  3. Load ClientConfig: env > TOML > defaults, then --api-url            │
/// │  4. Build the HTTP backend with request/connect timeouts                │
/// │  5. Dispatch the command                                                │
/// │  6. Print one error line on failure, exit with its code                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    init_tracing();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if err.retryable {
                eprintln!("hint: the backend may be temporarily unavailable; retry the command");
            }
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> Result<(), CliError> {
    let mut config = ClientConfig::load(cli.config.clone())?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
        config.validate()?;
    }
    info!(api = %config.api.base_url, "Configuration loaded");

    let backend = Arc::new(HttpBackend::from_config(&config)?);

    match cli.command {
        Command::Medicines { query } => {
            debug!(?query, "medicines command");
            commands::catalog::medicines(backend.as_ref(), query.as_deref()).await
        }
        Command::Details { name } => {
            debug!(%name, "details command");
            commands::catalog::details(backend.as_ref(), &name).await
        }
        Command::Bill(args) => {
            debug!(patient = %args.patient_id, items = args.items.len(), "bill command");
            commands::bill::bill(backend, &config, args).await.map(|_| ())
        }
        Command::Sales { from, to } => {
            debug!(%from, ?to, "sales command");
            commands::sales::sales(backend.as_ref(), from, to).await
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` for session and request detail
/// - Default: `info` for the app, `debug` for pharmabill crates
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pharmabill=debug,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
