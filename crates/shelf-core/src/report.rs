//! # Reports
//!
//! Read-only aggregations over the sales ledger, the catalog and the
//! customer list. Every function here is pure: it takes the rows already
//! loaded and a [`DateRange`], and recomputes on each call.
//!
//! ## Dashboard Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  &[SaleRecord] ──► in_range ──┬──► sales_summary                       │
//! │                               ├──► daily_revenue (gap-filled)          │
//! │                               ├──► top_sellers (qty, revenue tiebreak) │
//! │                               ├──► revenue_by_genre                    │
//! │                               └──► payment_breakdown                   │
//! │                                                                         │
//! │  &[Book] ─────────────────────────► inventory_snapshot                 │
//! │                                                                         │
//! │  Dashboard = all of the above for one range                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line revenue is `line_total_cents`, i.e. before the sale-level discount.
//! Summary revenue figures come from the sale headers.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Book, PaymentMethod, SaleRecord};

// =============================================================================
// Date Range
// =============================================================================

/// Half-open time window: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

impl DateRange {
    /// Validates `start <= end`.
    pub fn custom(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<Self> {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: "start must not be after end".to_string(),
            }
            .into());
        }
        Ok(DateRange { start, end })
    }

    /// The calendar day (UTC) containing `now`.
    pub fn today(now: DateTime<Utc>) -> Self {
        let start = start_of_day(now.date_naive());
        DateRange {
            start,
            end: start + Duration::days(1),
        }
    }

    /// The last `days` calendar days, today included.
    pub fn last_n_days(days: u32, now: DateTime<Utc>) -> Self {
        let days = i64::from(days.max(1));
        let end = start_of_day(now.date_naive()) + Duration::days(1);
        DateRange {
            start: end - Duration::days(days),
            end,
        }
    }

    /// From the first of the current month through the end of today.
    pub fn month_to_date(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let first = today.with_day(1).unwrap_or(today);
        DateRange {
            start: start_of_day(first),
            end: start_of_day(today) + Duration::days(1),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }

    /// Each calendar day the range touches.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.start.date_naive();
        while start_of_day(day) < self.end {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}

fn in_range<'a>(sales: &'a [SaleRecord], range: &'a DateRange) -> impl Iterator<Item = &'a SaleRecord> {
    sales.iter().filter(move |r| range.contains(r.sale.created_at))
}

// =============================================================================
// Sales
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: i64,
    /// Σ subtotal, before discounts.
    pub gross_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    /// Σ total.
    pub net_revenue_cents: i64,
    pub items_sold: i64,
    /// Net revenue over sale count, rounded half-up. 0 with no sales.
    pub average_sale_cents: i64,
}

pub fn sales_summary(sales: &[SaleRecord], range: &DateRange) -> SalesSummary {
    let mut summary = in_range(sales, range).fold(SalesSummary::default(), |mut acc, r| {
        acc.sale_count += 1;
        acc.gross_cents += r.sale.subtotal_cents;
        acc.discount_cents += r.sale.discount_cents;
        acc.tax_cents += r.sale.tax_cents;
        acc.net_revenue_cents += r.sale.total_cents;
        acc.items_sold += r.units();
        acc
    });

    if summary.sale_count > 0 {
        summary.average_sale_cents =
            (summary.net_revenue_cents * 2 + summary.sale_count) / (summary.sale_count * 2);
    }
    summary
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyRevenue {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sale_count: i64,
    pub revenue_cents: i64,
}

/// One entry per day in the range, zero-filled for days without sales.
pub fn daily_revenue(sales: &[SaleRecord], range: &DateRange) -> Vec<DailyRevenue> {
    let mut by_day: HashMap<NaiveDate, (i64, i64)> = HashMap::new();
    for r in in_range(sales, range) {
        let entry = by_day.entry(r.sale.created_at.date_naive()).or_default();
        entry.0 += 1;
        entry.1 += r.sale.total_cents;
    }

    range
        .days()
        .into_iter()
        .map(|date| {
            let (sale_count, revenue_cents) = by_day.get(&date).copied().unwrap_or_default();
            DailyRevenue {
                date,
                sale_count,
                revenue_cents,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopSeller {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

/// Best sellers by units, revenue breaking ties, then title.
pub fn top_sellers(sales: &[SaleRecord], range: &DateRange, limit: usize) -> Vec<TopSeller> {
    let mut by_book: HashMap<&str, TopSeller> = HashMap::new();
    for line in in_range(sales, range).flat_map(|r| r.lines.iter()) {
        let entry = by_book.entry(line.book_id.as_str()).or_insert_with(|| TopSeller {
            book_id: line.book_id.clone(),
            title: line.title.clone(),
            author: line.author.clone(),
            quantity: 0,
            revenue_cents: 0,
        });
        entry.quantity += line.quantity;
        entry.revenue_cents += line.line_total_cents;
    }

    let mut sellers: Vec<TopSeller> = by_book.into_values().collect();
    sellers.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| b.revenue_cents.cmp(&a.revenue_cents))
            .then_with(|| a.title.cmp(&b.title))
    });
    sellers.truncate(limit);
    sellers
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GenreRevenue {
    pub genre: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

/// Revenue per genre, highest first.
pub fn revenue_by_genre(sales: &[SaleRecord], range: &DateRange) -> Vec<GenreRevenue> {
    let mut by_genre: HashMap<&str, (i64, i64)> = HashMap::new();
    for line in in_range(sales, range).flat_map(|r| r.lines.iter()) {
        let entry = by_genre.entry(line.genre.as_str()).or_default();
        entry.0 += line.quantity;
        entry.1 += line.line_total_cents;
    }

    let mut genres: Vec<GenreRevenue> = by_genre
        .into_iter()
        .map(|(genre, (quantity, revenue_cents))| GenreRevenue {
            genre: genre.to_string(),
            quantity,
            revenue_cents,
        })
        .collect();
    genres.sort_by(|a, b| {
        b.revenue_cents
            .cmp(&a.revenue_cents)
            .then_with(|| a.genre.cmp(&b.genre))
    });
    genres
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentBreakdown {
    pub method: PaymentMethod,
    pub sale_count: i64,
    pub total_cents: i64,
}

/// One entry per payment method, in `PaymentMethod::ALL` order, zero rows
/// included.
pub fn payment_breakdown(sales: &[SaleRecord], range: &DateRange) -> Vec<PaymentBreakdown> {
    let mut rows: Vec<PaymentBreakdown> = PaymentMethod::ALL
        .iter()
        .map(|&method| PaymentBreakdown {
            method,
            sale_count: 0,
            total_cents: 0,
        })
        .collect();

    for r in in_range(sales, range) {
        if let Some(row) = rows.iter_mut().find(|row| row.method == r.sale.payment_method) {
            row.sale_count += 1;
            row.total_cents += r.sale.total_cents;
        }
    }
    rows
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventorySnapshot {
    pub title_count: usize,
    pub total_units: i64,
    pub retail_value_cents: i64,
    pub low_stock_threshold: i64,
    /// In stock but at or below the threshold, lowest first.
    pub low_stock: Vec<Book>,
    pub out_of_stock: Vec<Book>,
}

pub fn inventory_snapshot(books: &[Book], low_stock_threshold: i64) -> InventorySnapshot {
    let mut low_stock: Vec<Book> = books
        .iter()
        .filter(|b| b.stock > 0 && b.is_low_stock(low_stock_threshold))
        .cloned()
        .collect();
    low_stock.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.title.cmp(&b.title)));

    let mut out_of_stock: Vec<Book> = books.iter().filter(|b| b.stock == 0).cloned().collect();
    out_of_stock.sort_by(|a, b| a.title.cmp(&b.title));

    InventorySnapshot {
        title_count: books.len(),
        total_units: books.iter().map(|b| b.stock).sum(),
        retail_value_cents: books.iter().map(Book::stock_value).sum::<Money>().cents(),
        low_stock_threshold,
        low_stock,
        out_of_stock,
    }
}

// =============================================================================
// Customers
// =============================================================================

/// Purchase aggregates for one customer, over all recorded sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerStats {
    pub customer_id: String,
    pub sale_count: i64,
    pub total_spent_cents: i64,
    #[ts(as = "Option<String>")]
    pub last_purchase_at: Option<DateTime<Utc>>,
}

/// Aggregates keyed by customer id. Anonymous sales are skipped.
pub fn customer_stats(sales: &[SaleRecord]) -> HashMap<String, CustomerStats> {
    let mut stats: HashMap<String, CustomerStats> = HashMap::new();
    for r in sales {
        let Some(customer_id) = r.sale.customer_id.as_deref() else {
            continue;
        };
        let entry = stats
            .entry(customer_id.to_string())
            .or_insert_with(|| CustomerStats {
                customer_id: customer_id.to_string(),
                sale_count: 0,
                total_spent_cents: 0,
                last_purchase_at: None,
            });
        entry.sale_count += 1;
        entry.total_spent_cents += r.sale.total_cents;
        if entry.last_purchase_at.map_or(true, |t| r.sale.created_at > t) {
            entry.last_purchase_at = Some(r.sale.created_at);
        }
    }
    stats
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Dashboard {
    pub range: DateRange,
    pub summary: SalesSummary,
    pub daily: Vec<DailyRevenue>,
    pub top_sellers: Vec<TopSeller>,
    pub genres: Vec<GenreRevenue>,
    pub payments: Vec<PaymentBreakdown>,
    pub inventory: InventorySnapshot,
}

/// Number of best sellers the dashboard lists.
pub const DASHBOARD_TOP_SELLERS: usize = 5;

pub fn dashboard(
    sales: &[SaleRecord],
    books: &[Book],
    range: DateRange,
    low_stock_threshold: i64,
) -> Dashboard {
    Dashboard {
        range,
        summary: sales_summary(sales, &range),
        daily: daily_revenue(sales, &range),
        top_sellers: top_sellers(sales, &range, DASHBOARD_TOP_SELLERS),
        genres: revenue_by_genre(sales, &range),
        payments: payment_breakdown(sales, &range),
        inventory: inventory_snapshot(books, low_stock_threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sale, SaleLine, SaleStatus};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn line(sale_id: &str, book: &str, genre: &str, qty: i64, price: i64) -> SaleLine {
        SaleLine {
            id: format!("{}-{}", sale_id, book),
            sale_id: sale_id.to_string(),
            book_id: book.to_string(),
            title: format!("Title {}", book),
            author: "Someone".to_string(),
            genre: genre.to_string(),
            quantity: qty,
            unit_price_cents: price,
            line_total_cents: qty * price,
        }
    }

    fn record(
        id: &str,
        customer: Option<&str>,
        method: PaymentMethod,
        created_at: DateTime<Utc>,
        lines: Vec<SaleLine>,
    ) -> SaleRecord {
        let subtotal: i64 = lines.iter().map(|l| l.line_total_cents).sum();
        let tax = (subtotal * 800 + 5000) / 10000;
        SaleRecord {
            sale: Sale {
                id: id.to_string(),
                customer_id: customer.map(str::to_string),
                subtotal_cents: subtotal,
                tax_cents: tax,
                discount_cents: 0,
                total_cents: subtotal + tax,
                payment_method: method,
                status: SaleStatus::Completed,
                notes: None,
                created_at,
            },
            customer_name: None,
            lines,
        }
    }

    fn ledger() -> Vec<SaleRecord> {
        vec![
            record(
                "s1",
                Some("c1"),
                PaymentMethod::Cash,
                at(2026, 3, 1, 10),
                vec![line("s1", "B1", "Fantasy", 3, 1000)],
            ),
            record(
                "s2",
                Some("c1"),
                PaymentMethod::Card,
                at(2026, 3, 3, 15),
                vec![
                    line("s2", "B1", "Fantasy", 1, 1000),
                    line("s2", "B2", "History", 2, 2500),
                ],
            ),
            record(
                "s3",
                None,
                PaymentMethod::Card,
                at(2026, 2, 20, 9),
                vec![line("s3", "B3", "Poetry", 10, 500)],
            ),
        ]
    }

    fn march_first_week() -> DateRange {
        DateRange::custom(at(2026, 3, 1, 0), at(2026, 3, 8, 0)).unwrap()
    }

    #[test]
    fn test_date_range_constructors() {
        let now = at(2026, 3, 14, 17);

        let today = DateRange::today(now);
        assert_eq!(today.start, at(2026, 3, 14, 0));
        assert_eq!(today.end, at(2026, 3, 15, 0));
        assert!(today.contains(now));
        assert!(!today.contains(today.end));

        let week = DateRange::last_n_days(7, now);
        assert_eq!(week.start, at(2026, 3, 8, 0));
        assert_eq!(week.days().len(), 7);

        let mtd = DateRange::month_to_date(now);
        assert_eq!(mtd.start, at(2026, 3, 1, 0));
        assert_eq!(mtd.end, at(2026, 3, 15, 0));

        assert!(DateRange::custom(now, now - Duration::hours(1)).is_err());
    }

    #[test]
    fn test_sales_summary_windowed() {
        let summary = sales_summary(&ledger(), &march_first_week());
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.gross_cents, 3000 + 6000);
        assert_eq!(summary.tax_cents, 240 + 480);
        assert_eq!(summary.net_revenue_cents, 3240 + 6480);
        assert_eq!(summary.items_sold, 6);
        assert_eq!(summary.average_sale_cents, 4860);
    }

    #[test]
    fn test_empty_summary_has_zero_average() {
        let summary = sales_summary(&[], &march_first_week());
        assert_eq!(summary, SalesSummary::default());
    }

    #[test]
    fn test_daily_revenue_is_gap_filled() {
        let daily = daily_revenue(&ledger(), &march_first_week());
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0].revenue_cents, 3240);
        assert_eq!(daily[1].sale_count, 0);
        assert_eq!(daily[2].revenue_cents, 6480);
    }

    #[test]
    fn test_top_sellers_rank_by_quantity() {
        let top = top_sellers(&ledger(), &march_first_week(), 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].book_id, "B1");
        assert_eq!(top[0].quantity, 4);
        assert_eq!(top[0].revenue_cents, 4000);
        assert_eq!(top[1].book_id, "B2");

        assert_eq!(top_sellers(&ledger(), &march_first_week(), 1).len(), 1);
    }

    #[test]
    fn test_revenue_by_genre_sorted() {
        let genres = revenue_by_genre(&ledger(), &march_first_week());
        assert_eq!(genres[0].genre, "History");
        assert_eq!(genres[0].revenue_cents, 5000);
        assert_eq!(genres[1].genre, "Fantasy");
        assert_eq!(genres[1].quantity, 4);
    }

    #[test]
    fn test_payment_breakdown_includes_all_methods() {
        let rows = payment_breakdown(&ledger(), &march_first_week());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].method, PaymentMethod::Cash);
        assert_eq!(rows[0].sale_count, 1);
        assert_eq!(rows[1].sale_count, 1);
        assert_eq!(rows[2].sale_count, 0);
    }

    #[test]
    fn test_customer_stats_skip_anonymous() {
        let stats = customer_stats(&ledger());
        assert_eq!(stats.len(), 1);
        let c1 = &stats["c1"];
        assert_eq!(c1.sale_count, 2);
        assert_eq!(c1.total_spent_cents, 3240 + 6480);
        assert_eq!(c1.last_purchase_at, Some(at(2026, 3, 3, 15)));
    }

    #[test]
    fn test_inventory_snapshot() {
        let now = Utc::now();
        let mk = |title: &str, price: i64, stock: i64| Book {
            id: title.to_string(),
            title: title.to_string(),
            author: "A".to_string(),
            isbn: None,
            genre: "G".to_string(),
            price_cents: price,
            stock,
            created_at: now,
            updated_at: now,
        };
        let books = vec![mk("A", 1000, 10), mk("B", 500, 3), mk("C", 700, 0), mk("D", 100, 5)];

        let snap = inventory_snapshot(&books, 5);
        assert_eq!(snap.title_count, 4);
        assert_eq!(snap.total_units, 18);
        assert_eq!(snap.retail_value_cents, 10000 + 1500 + 500);
        assert_eq!(snap.low_stock.len(), 2);
        assert_eq!(snap.low_stock[0].title, "B");
        assert_eq!(snap.out_of_stock.len(), 1);
        assert_eq!(snap.out_of_stock[0].title, "C");
    }
}
