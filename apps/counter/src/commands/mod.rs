//! # Counter Commands
//!
//! One module per subcommand. Each returns `Result<(), CliError>` and prints
//! its results on stdout; `lib.rs` turns errors into exit codes.
//!
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── catalog.rs  ◄─── medicines, details
//! ├── bill.rs     ◄─── bill
//! └── sales.rs    ◄─── sales
//! ```

pub mod bill;
pub mod catalog;
pub mod sales;
