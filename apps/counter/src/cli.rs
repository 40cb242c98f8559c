//! Command-line definition.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pharmabill_core::validation::{validate_medicine_name, validate_quantity};
use pharmabill_core::{DiscountRate, Money, PaymentMode};

#[derive(Parser, Debug)]
#[command(name = "pharmabill")]
#[command(about = "Pharmacy counter billing")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides config and environment
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List medicine names, or search them
    Medicines {
        /// Case-insensitive search text; prefix matches come first
        query: Option<String>,
    },

    /// Show price, batch and expiry of a medicine
    Details {
        /// Exact medicine name
        name: String,
    },

    /// Bill a patient and write the invoice
    Bill(BillArgs),

    /// Sales report for a date range
    Sales {
        /// First day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD); defaults to --from
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
    },
}

#[derive(clap::Args, Debug)]
pub struct BillArgs {
    #[arg(long)]
    pub patient_id: String,

    #[arg(long, default_value = "")]
    pub patient_name: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    /// Line item as NAME=QTY or NAME=QTY@PRICE; repeatable
    #[arg(long = "item", short = 'i', required = true)]
    pub items: Vec<ItemSpec>,

    /// Discount percent, e.g. 10 or 12.5
    #[arg(long, short = 'd', value_parser = parse_discount)]
    pub discount: Option<DiscountRate>,

    /// Amount handed over by the patient
    #[arg(long, short = 't', value_parser = parse_money)]
    pub tendered: Option<Money>,

    /// cash or online
    #[arg(long, short = 'm', default_value = "cash", value_parser = parse_mode)]
    pub mode: PaymentMode,

    /// Invoice directory, overrides config
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,

    /// Show the settlement without saving the bill
    #[arg(long)]
    pub dry_run: bool,
}

/// One `--item` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    pub name: String,
    pub quantity: i64,
    pub price: Option<Money>,
}

impl FromStr for ItemSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("Invalid item '{}'. Expected NAME=QTY or NAME=QTY@PRICE", s))?;
        let name = name.trim();
        validate_medicine_name(name).map_err(|e| e.to_string())?;

        let (qty, price) = match rest.split_once('@') {
            Some((qty, price)) => {
                let price = parse_money(price)?;
                if price.is_negative() {
                    return Err(format!("Price for {} cannot be negative", name));
                }
                (qty, Some(price))
            }
            None => (rest, None),
        };
        let quantity = qty
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("Invalid quantity '{}' for {}", qty.trim(), name))?;
        validate_quantity(quantity).map_err(|e| e.to_string())?;

        Ok(ItemSpec {
            name: name.to_string(),
            quantity,
            price,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}'. Expected YYYY-MM-DD", s))
}

fn parse_money(s: &str) -> Result<Money, String> {
    Money::parse_major(s).map_err(|e| e.to_string())
}

fn parse_discount(s: &str) -> Result<DiscountRate, String> {
    DiscountRate::parse_percent(s.trim().trim_end_matches('%')).map_err(|e| e.to_string())
}

fn parse_mode(s: &str) -> Result<PaymentMode, String> {
    s.parse::<PaymentMode>().map_err(|e| e.to_string())
}
