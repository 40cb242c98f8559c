//! # Invoice Renderer
//!
//! Turns a [`PersistedTransaction`] into a paged, fixed-width text document.
//! Rendering is pure; writing the file is the caller's job.
//!
//! ```text
//! ┌──────────────────────────── 80 columns ────────────────────────────┐
//! │                         SHOP NAME                                  │
//! │                      address / phone / DL                          │
//! │ ================================================================== │
//! │ INVOICE                                     Date: 19-10-2026 14:03 │
//! │ Patient ID / Name / Phone                                          │
//! │ ------------------------------------------------------------------ │
//! │  Sr | Medicine | Qty | Price | Batch | Expiry | Amount             │  60
//! │ ------------------------------------------------------------------ │ rows
//! │                                          Subtotal / Discount / ... │
//! │                                                                    │
//! │                                                        Page 1 of 1 │
//! └────────────────────────────────────────────────────────────────────┘
//! pages are joined with a form feed (\x0c)
//! ```

use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Style},
};

use crate::emitter::PersistedTransaction;
use crate::types::ShopIdentity;

/// Characters per line.
pub const PAGE_WIDTH: usize = 80;

/// Lines per page, footer included.
pub const PAGE_HEIGHT: usize = 60;

const FORM_FEED: char = '\x0c';

const MEDICINE_COLUMN_WIDTH: usize = 16;
const BATCH_COLUMN_WIDTH: usize = 8;

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDocument {
    file_name: String,
    pages: Vec<String>,
}

impl InvoiceDocument {
    /// Renders the invoice for a persisted transaction.
    pub fn render(shop: &ShopIdentity, transaction: &PersistedTransaction) -> Self {
        let mut body = Vec::new();
        push_shop_header(&mut body, shop);
        push_patient_block(&mut body, transaction);
        push_item_table(&mut body, transaction);
        push_settlement_summary(&mut body, transaction);
        body.push(String::new());
        body.push(center("Thank you! Get well soon.", PAGE_WIDTH));

        InvoiceDocument {
            file_name: invoice_file_name(&transaction.patient().patient_id),
            pages: paginate(body),
        }
    }

    /// `invoice-<patient id>.txt`, with unsafe characters replaced.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The whole document, pages separated by form feeds.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                text.push(FORM_FEED);
            }
            text.push_str(page);
        }
        text
    }
}

/// File name for a patient's invoice.
///
/// ```rust
/// use pharmabill_core::invoice::invoice_file_name;
///
/// assert_eq!(invoice_file_name("P-1001"), "invoice-P-1001.txt");
/// assert_eq!(invoice_file_name("../x y"), "invoice-___x_y.txt");
/// ```
pub fn invoice_file_name(patient_id: &str) -> String {
    let safe: String = patient_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("invoice-{}.txt", safe)
}

// =============================================================================
// Sections
// =============================================================================

fn push_shop_header(body: &mut Vec<String>, shop: &ShopIdentity) {
    body.push(center(&shop.name.to_uppercase(), PAGE_WIDTH));
    for line in &shop.address_lines {
        body.push(center(line, PAGE_WIDTH));
    }

    let contact: Vec<String> = [
        shop.phone.as_ref().map(|p| format!("Phone: {}", p)),
        shop.licence_no.as_ref().map(|l| format!("DL No: {}", l)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !contact.is_empty() {
        body.push(center(&contact.join("  |  "), PAGE_WIDTH));
    }

    body.push("=".repeat(PAGE_WIDTH));
}

fn push_patient_block(body: &mut Vec<String>, transaction: &PersistedTransaction) {
    let date = format!(
        "Date: {}",
        transaction.persisted_at().format("%d-%m-%Y %H:%M UTC")
    );
    body.push(spread("INVOICE", &date, PAGE_WIDTH));

    let patient = transaction.patient();
    body.push(format!("Patient ID : {}", patient.patient_id));
    if !patient.patient_name.is_empty() {
        body.push(format!("Name       : {}", patient.patient_name));
    }
    if !patient.patient_phone.is_empty() {
        body.push(format!("Phone      : {}", patient.patient_phone));
    }
    body.push("-".repeat(PAGE_WIDTH));
}

fn push_item_table(body: &mut Vec<String>, transaction: &PersistedTransaction) {
    let mut builder = Builder::default();
    builder.push_record(["Sr", "Medicine", "Qty", "Price", "Batch", "Expiry", "Amount"]);

    for (i, line) in transaction.lines().iter().enumerate() {
        builder.push_record([
            (i + 1).to_string(),
            wrap(line.medicine_name(), MEDICINE_COLUMN_WIDTH),
            line.quantity().to_string(),
            line.unit_price().to_string(),
            truncate(line.batch_no(), BATCH_COLUMN_WIDTH),
            line.expiry_date().format("%m/%Y").to_string(),
            line.line_amount().to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::psql());
    table.modify(Columns::new(2..4), Alignment::right());
    table.modify(Columns::new(6..7), Alignment::right());

    for row in table.to_string().lines() {
        body.push(truncate(row, PAGE_WIDTH));
    }
    body.push("-".repeat(PAGE_WIDTH));
}

fn push_settlement_summary(body: &mut Vec<String>, transaction: &PersistedTransaction) {
    let s = transaction.settlement();

    let mut rows: Vec<(String, String)> = vec![
        ("Subtotal".to_string(), s.subtotal.to_string()),
        (
            format!("Discount ({})", s.discount),
            format!("-{}", s.discount_amount),
        ),
        ("Total".to_string(), s.discounted_total.to_string()),
        ("Amount payable".to_string(), format!("₹{}", s.rounded_total)),
    ];
    if let Some(tendered) = s.amount_tendered {
        rows.push(("Amount received".to_string(), tendered.to_string()));
    }
    if let Some(change) = s.change {
        rows.push(("Change".to_string(), change.to_string()));
    }
    rows.push(("Payment mode".to_string(), s.payment_mode.to_string()));

    for (label, value) in rows {
        let row = format!("{:<18}{:>14}", format!("{}:", label), value);
        body.push(format!("{:>width$}", row, width = PAGE_WIDTH));
    }
}

// =============================================================================
// Layout Helpers
// =============================================================================

fn paginate(body: Vec<String>) -> Vec<String> {
    // one line reserved for the footer, one blank line above it
    let per_page = PAGE_HEIGHT - 2;
    let mut chunks: Vec<&[String]> = body.chunks(per_page).collect();
    if chunks.is_empty() {
        chunks.push(&body[..]);
    }
    let total = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut lines: Vec<String> = chunk.to_vec();
            lines.resize(PAGE_HEIGHT - 1, String::new());
            lines.push(format!(
                "{:>width$}",
                format!("Page {} of {}", i + 1, total),
                width = PAGE_WIDTH
            ));
            let mut page = lines.join("\n");
            page.push('\n');
            page
        })
        .collect()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

/// Word-wraps `text` into lines of at most `width` characters, splitting
/// words longer than a line. Lines are joined with `\n` for a multi-line cell.
fn wrap(text: &str, width: usize) -> String {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }

        let used = current.chars().count();
        if used > 0 && used + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

fn center(text: &str, width: usize) -> String {
    let text = truncate(text, width);
    let pad = (width - text.chars().count()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

fn spread(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = width.saturating_sub(used).max(1);
    truncate(&format!("{}{}{}", left, " ".repeat(gap), right), width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::emitter::{InvoiceEmitter, TransactionDraft};
    use crate::money::Money;
    use crate::settlement::Settlement;
    use crate::types::{DiscountRate, MedicineRef, PatientInfo, PaymentMode};
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn medicine(name: &str, paise: i64) -> MedicineRef {
        MedicineRef {
            name: name.to_string(),
            mrp: Money::from_paise(paise),
            batch_no: "B-2201".to_string(),
            expiry_date: NaiveDate::from_ymd_opt(2027, 3, 31).unwrap(),
        }
    }

    fn persisted(cart: &Cart, patient_id: &str) -> PersistedTransaction {
        let settlement = Settlement::compute(
            cart.subtotal(),
            DiscountRate::from_percent(10),
            Some(Money::from_rupees(60)),
            PaymentMode::Cash,
        )
        .unwrap();
        let patient = PatientInfo {
            patient_id: patient_id.to_string(),
            patient_name: "Asha Rao".to_string(),
            patient_phone: "9876543210".to_string(),
        };
        let draft = TransactionDraft::new(&patient, cart, settlement).unwrap();

        let mut emitter = InvoiceEmitter::new(Uuid::new_v4());
        let ticket = emitter.begin(draft).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 14, 3, 0).unwrap();
        emitter.confirm_persisted(ticket, at, None).unwrap()
    }

    fn assert_page_shape(page: &str) {
        let lines: Vec<&str> = page.lines().collect();
        assert_eq!(lines.len(), PAGE_HEIGHT);
        for line in lines {
            assert!(line.chars().count() <= PAGE_WIDTH, "line too wide: {:?}", line);
        }
    }

    #[test]
    fn test_single_page_invoice() {
        let mut cart = Cart::new();
        cart.add_line(&medicine("Paracetamol 500mg", 1050), 2, None).unwrap();
        cart.add_line(&medicine("Cough Syrup", 4450), 1, None).unwrap();

        let shop = ShopIdentity {
            name: "Green Cross Pharmacy".to_string(),
            address_lines: vec!["12 MG Road, Pune".to_string()],
            phone: Some("020-1234567".to_string()),
            licence_no: Some("MH-PZ-1234".to_string()),
        };
        let doc = InvoiceDocument::render(&shop, &persisted(&cart, "P-1001"));

        assert_eq!(doc.file_name(), "invoice-P-1001.txt");
        assert_eq!(doc.page_count(), 1);
        assert_page_shape(&doc.pages()[0]);

        let text = doc.to_text();
        assert!(text.contains("GREEN CROSS PHARMACY"));
        assert!(text.contains("DL No: MH-PZ-1234"));
        assert!(text.contains("Patient ID : P-1001"));
        // names wider than the column wrap instead of being cut
        assert!(text.contains("Paracetamol"));
        assert!(text.contains("500mg"));
        assert!(!text.contains('…'));
        assert!(text.contains("₹65.50"));
        assert!(text.contains("-₹6.55"));
        assert!(text.contains("₹58.95"));
        assert!(text.contains("₹59"));
        assert!(text.contains("₹1.05"));
        assert!(text.contains("Page 1 of 1"));
        assert!(!text.contains(FORM_FEED));
    }

    #[test]
    fn test_long_cart_spans_pages() {
        let mut cart = Cart::new();
        for i in 0..70 {
            cart.add_line(&medicine(&format!("Medicine {}", i), 100), 1, None)
                .unwrap();
        }

        let doc = InvoiceDocument::render(&ShopIdentity::default(), &persisted(&cart, "P-2"));

        assert_eq!(doc.page_count(), 2);
        for page in doc.pages() {
            assert_page_shape(page);
        }
        assert!(doc.pages()[0].contains("Page 1 of 2"));
        assert!(doc.pages()[1].contains("Page 2 of 2"));
        assert_eq!(doc.to_text().matches(FORM_FEED).count(), 1);
    }

    #[test]
    fn test_helpers() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
        assert_eq!(center("ab", 6), "  ab");
        assert_eq!(spread("L", "R", 5), "L   R");

        assert_eq!(wrap("Cough Syrup", 16), "Cough Syrup");
        assert_eq!(wrap("Paracetamol 500mg", 16), "Paracetamol\n500mg");
        assert_eq!(wrap("Amoxicillin Clavulanate 625mg", 16), "Amoxicillin\nClavulanate\n625mg");
        assert_eq!(wrap("Chlorpheniramine-maleate", 16), "Chlorpheniramine\n-maleate");
        assert_eq!(wrap("", 16), "");
    }

    #[test]
    fn test_long_medicine_name_kept_whole() {
        let mut cart = Cart::new();
        cart.add_line(&medicine("Amoxicillin Clavulanate Potassium 625mg", 2250), 1, None)
            .unwrap();

        let doc = InvoiceDocument::render(&ShopIdentity::default(), &persisted(&cart, "P-3"));

        assert_eq!(doc.page_count(), 1);
        assert_page_shape(&doc.pages()[0]);
        let text = doc.to_text();
        for word in ["Amoxicillin", "Clavulanate", "Potassium", "625mg"] {
            assert!(text.contains(word), "missing {}", word);
        }
    }
}
