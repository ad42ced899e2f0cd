//! # Command-Line Arguments
//!
//! Subcommands of the `shelf-pos` binary.
//!
//! ```bash
//! # Dashboard JSON for the last 7 days
//! shelf-pos dashboard --days 7
//!
//! # Ring up two copies paid by card
//! shelf-pos sell 3f2c9a6e-... --qty 2 --method card
//!
//! # Bootstrap the first administrator
//! shelf-pos grant-admin manager
//! ```
//!
//! Environment: `SHELF_DB_PATH`, `SHELF_ADMIN_USER`, `SHELF_STORE_NAME`,
//! `SHELF_TAX_RATE`, `SHELF_LOW_STOCK_THRESHOLD`, `SHELF_CURRENCY_SYMBOL`,
//! `RUST_LOG`.

use clap::{Parser, Subcommand};
use shelf_core::PaymentMethod;

#[derive(Debug, Parser)]
#[command(name = "shelf-pos")]
#[command(author, version, about = "Shelf POS bookstore tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Dashboard JSON for the last N days
    Dashboard {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Inventory snapshot JSON
    Inventory,
    /// Books at or below the low-stock threshold
    LowStock,
    /// Sales of the last N days
    Sales {
        #[arg(long, default_value_t = 1)]
        days: u32,
    },
    /// Customers ranked by total spent
    Customers,
    /// Sell one book and print the receipt
    Sell {
        book_id: String,

        #[arg(long = "qty", default_value_t = 1)]
        quantity: i64,

        /// Amount tendered in cents; defaults to the exact total
        #[arg(long = "paid")]
        paid_cents: Option<i64>,

        /// `cash`, `card` or `mobile`
        #[arg(long, default_value = "cash")]
        method: PaymentMethod,
    },
    /// Add an administrator
    GrantAdmin { user_id: String },
    /// Remove an administrator
    RevokeAdmin { user_id: String },
}
