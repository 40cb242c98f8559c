//! # Terminal Output & Invoice Files
//!
//! Tables printed on stdout and the invoice file written after a saved bill.
//!
//! Invoice files are never overwritten: a second bill for the same patient in
//! the same directory gets a numeric suffix.
//!
//! ```text
//! invoices/
//! ├── invoice-P-1001.txt
//! ├── invoice-P-1001-2.txt
//! └── invoice-P-1001-3.txt
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pharmabill_core::{Cart, InvoiceDocument, MedicineRef, SalesSummary, Settlement};
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tracing::info;

/// Give up after this many numbered names.
const MAX_NAME_SUFFIX: u32 = 1000;

// =============================================================================
// Invoice Files
// =============================================================================

/// Writes the invoice under `dir`, creating the directory if needed.
///
/// Returns the path written.
pub fn write_invoice(dir: &Path, document: &InvoiceDocument) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let (stem, ext) = split_name(document.file_name());
    let text = document.to_text();

    for n in 1..=MAX_NAME_SUFFIX {
        let path = if n == 1 {
            dir.join(document.file_name())
        } else {
            dir.join(format!("{}-{}{}", stem, n, ext))
        };

        // create_new refuses existing files atomically
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(text.as_bytes())?;
                file.flush()?;
                info!(path = %path.display(), pages = document.page_count(), "Invoice written");
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("too many invoices named {} in {}", document.file_name(), dir.display()),
    ))
}

fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(i) if i > 0 => (&file_name[..i], &file_name[i..]),
        _ => (file_name, ""),
    }
}

// =============================================================================
// Tables
// =============================================================================

pub fn medicine_table(medicine: &MedicineRef) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Medicine", "MRP", "Batch", "Expiry"]);
    builder.push_record([
        medicine.name.clone(),
        medicine.mrp.to_string(),
        medicine.batch_no.clone(),
        medicine.expiry_date.format("%m/%Y").to_string(),
    ]);

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn cart_table(cart: &Cart) -> String {
    let mut builder = Builder::default();
    builder.push_record(["#", "Medicine", "Qty", "Price", "Amount"]);
    for (i, line) in cart.lines().iter().enumerate() {
        let price = if line.is_price_overridden() {
            format!("{}*", line.unit_price())
        } else {
            line.unit_price().to_string()
        };
        builder.push_record([
            (i + 1).to_string(),
            line.medicine_name().to_string(),
            line.quantity().to_string(),
            price,
            line.line_amount().to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.modify(Columns::new(2..), Alignment::right());
    table.to_string()
}

pub fn settlement_table(settlement: &Settlement) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Subtotal".to_string(), settlement.subtotal.to_string()]);
    builder.push_record([
        format!("Discount ({})", settlement.discount),
        format!("-{}", settlement.discount_amount),
    ]);
    builder.push_record(["Total".to_string(), settlement.discounted_total.to_string()]);
    builder.push_record(["Amount payable".to_string(), format!("₹{}", settlement.rounded_total)]);
    if let Some(tendered) = settlement.amount_tendered {
        builder.push_record(["Amount received".to_string(), tendered.to_string()]);
    }
    if let Some(change) = settlement.change {
        builder.push_record(["Change".to_string(), change.to_string()]);
    }
    builder.push_record(["Payment mode".to_string(), settlement.payment_mode.to_string()]);

    let mut table = builder.build();
    table.with(Style::rounded());
    table.modify(Columns::new(1..2), Alignment::right());
    table.to_string()
}

pub fn sales_table(summary: &SalesSummary) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Medicine", "Qty sold", "Revenue"]);
    for row in &summary.by_medicine {
        builder.push_record([
            row.medicine_name.clone(),
            row.quantity.to_string(),
            row.revenue.to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());
    table.to_string()
}
