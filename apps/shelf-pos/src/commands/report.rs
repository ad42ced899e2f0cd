//! # Report Commands
//!
//! Read-only views over the sales ledger and the catalog store. Every
//! aggregate is recomputed on each call; nothing is cached.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RangeRequest ──resolve(now)──► DateRange [start, end)                  │
//! │                                      │                                  │
//! │  SalesLedger ───────────────────────►├──► summary / daily / top sellers │
//! │                                      │    genres / payments             │
//! │  CatalogStore ──────────────────────►└──► inventory snapshot            │
//! │                                                                         │
//! │  All of it ──► get_dashboard                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_core::report::{
    self, Dashboard, DateRange, GenreRevenue, InventorySnapshot, PaymentBreakdown, SalesSummary,
    TopSeller,
};
use tracing::debug;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::{CatalogStore, ConfigState, DbState, SalesLedger};

/// Reporting window as the UI asks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeRequest {
    Today,
    LastDays {
        days: u32,
    },
    MonthToDate,
    Custom {
        #[ts(as = "String")]
        start: DateTime<Utc>,
        #[ts(as = "String")]
        end: DateTime<Utc>,
    },
}

impl Default for RangeRequest {
    fn default() -> Self {
        RangeRequest::LastDays { days: 30 }
    }
}

impl RangeRequest {
    /// ## Errors
    /// * `VALIDATION_FAILED` - custom range with start after end
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateRange, ApiError> {
        Ok(match *self {
            RangeRequest::Today => DateRange::today(now),
            RangeRequest::LastDays { days } => DateRange::last_n_days(days, now),
            RangeRequest::MonthToDate => DateRange::month_to_date(now),
            RangeRequest::Custom { start, end } => DateRange::custom(start, end)?,
        })
    }
}

pub async fn get_dashboard(
    db: &DbState,
    catalog: &CatalogStore,
    ledger: &SalesLedger,
    config: &ConfigState,
    user_id: &str,
    range: RangeRequest,
) -> Result<Dashboard, ApiError> {
    debug!(range = ?range, "get_dashboard command");
    let range = range.resolve(Utc::now())?;
    db.session(user_id).await?;

    let books = catalog.snapshot();
    Ok(ledger.with_sales(|sales| {
        report::dashboard(sales, &books, range, config.low_stock_threshold)
    }))
}

pub async fn get_sales_summary(
    db: &DbState,
    ledger: &SalesLedger,
    user_id: &str,
    range: RangeRequest,
) -> Result<SalesSummary, ApiError> {
    debug!(range = ?range, "get_sales_summary command");
    let range = range.resolve(Utc::now())?;
    db.session(user_id).await?;

    Ok(ledger.with_sales(|sales| report::sales_summary(sales, &range)))
}

/// Best sellers by units, revenue breaking ties.
pub async fn get_top_sellers(
    db: &DbState,
    ledger: &SalesLedger,
    user_id: &str,
    range: RangeRequest,
    limit: usize,
) -> Result<Vec<TopSeller>, ApiError> {
    debug!(range = ?range, limit = limit, "get_top_sellers command");
    let range = range.resolve(Utc::now())?;
    db.session(user_id).await?;

    Ok(ledger.with_sales(|sales| report::top_sellers(sales, &range, limit)))
}

pub async fn get_revenue_by_genre(
    db: &DbState,
    ledger: &SalesLedger,
    user_id: &str,
    range: RangeRequest,
) -> Result<Vec<GenreRevenue>, ApiError> {
    debug!(range = ?range, "get_revenue_by_genre command");
    let range = range.resolve(Utc::now())?;
    db.session(user_id).await?;

    Ok(ledger.with_sales(|sales| report::revenue_by_genre(sales, &range)))
}

pub async fn get_payment_breakdown(
    db: &DbState,
    ledger: &SalesLedger,
    user_id: &str,
    range: RangeRequest,
) -> Result<Vec<PaymentBreakdown>, ApiError> {
    debug!(range = ?range, "get_payment_breakdown command");
    let range = range.resolve(Utc::now())?;
    db.session(user_id).await?;

    Ok(ledger.with_sales(|sales| report::payment_breakdown(sales, &range)))
}

pub async fn get_inventory_report(
    db: &DbState,
    catalog: &CatalogStore,
    config: &ConfigState,
    user_id: &str,
) -> Result<InventorySnapshot, ApiError> {
    debug!("get_inventory_report command");
    db.session(user_id).await?;
    Ok(catalog.inventory(config.low_stock_threshold))
}
