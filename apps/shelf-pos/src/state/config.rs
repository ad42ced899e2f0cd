//! # Configuration State
//!
//! Stores application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`SHELF_*`)
//! 2. Defaults (this file)
//!
//! Read-only after initialization, so no lock.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shelf_core::{TaxRate, DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_TAX_RATE_BPS};
use ts_rs::TS;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name (printed on receipts)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Tax rate in basis points, 800 = 8%
    pub tax_rate_bps: u32,

    /// Books with `0 < stock <= threshold` count as low stock
    pub low_stock_threshold: i64,

    /// Administrator the binary acts as
    pub admin_user: String,

    /// Explicit database file; `None` means the platform data directory
    #[ts(as = "Option<String>")]
    pub db_path: Option<PathBuf>,
}

impl Default for ConfigState {
    /// ## Default Values
    /// - Store: "Shelf Books"
    /// - Currency: $
    /// - Tax: 8%
    /// - Low stock: 5 units
    /// - Admin: "admin"
    fn default() -> Self {
        ConfigState {
            store_name: "Shelf Books".to_string(),
            currency_symbol: "$".to_string(),
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            admin_user: "admin".to_string(),
            db_path: None,
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables over defaults.
    ///
    /// ## Environment Variables
    /// - `SHELF_STORE_NAME`: store name
    /// - `SHELF_CURRENCY_SYMBOL`: currency symbol
    /// - `SHELF_TAX_RATE`: tax rate percent (e.g., "8" or "8.25")
    /// - `SHELF_LOW_STOCK_THRESHOLD`: low-stock threshold in units
    /// - `SHELF_ADMIN_USER`: administrator user id
    /// - `SHELF_DB_PATH`: database file path
    ///
    /// Unparseable numbers keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ConfigState::default();

        if let Some(store_name) = lookup("SHELF_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(symbol) = lookup("SHELF_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(rate) = lookup("SHELF_TAX_RATE").and_then(|s| s.trim().parse::<f64>().ok()) {
            if rate.is_finite() && rate >= 0.0 {
                config.tax_rate_bps = TaxRate::from_percentage(rate).bps();
            }
        }

        if let Some(threshold) =
            lookup("SHELF_LOW_STOCK_THRESHOLD").and_then(|s| s.trim().parse::<i64>().ok())
        {
            config.low_stock_threshold = threshold.max(0);
        }

        if let Some(admin) = lookup("SHELF_ADMIN_USER").filter(|s| !s.trim().is_empty()) {
            config.admin_user = admin.trim().to_string();
        }

        if let Some(path) = lookup("SHELF_DB_PATH").filter(|s| !s.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        config
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(2940), "$29.40");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        format!(
            "{}{}{}.{:02}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            (cents / 100).abs(),
            (cents % 100).abs()
        )
    }
}
