//! # Query Views
//!
//! Filtering, sorting and pagination over the in-memory catalog and
//! customer lists. Nothing here touches the database; the stores in the app
//! crate hold the loaded rows and run these on read.
//!
//! ```text
//! Vec<Book> ──► BookFilter::matches ──► sort_books ──► paginate ──► Page<Book>
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::report::CustomerStats;
use crate::types::{Book, Customer};

/// Upper bound on page size.
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size when the caller passes none.
pub const DEFAULT_PAGE_SIZE: usize = 20;

// =============================================================================
// Common
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// One page of results. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slices `items` into the requested page.
///
/// `page` below 1 is treated as 1 and `page_size` is clamped into
/// `1..=MAX_PAGE_SIZE`. A page past the end comes back empty with the real
/// totals.
///
/// ```rust
/// use shelf_core::query::paginate;
///
/// let page = paginate((1..=45).collect::<Vec<_>>(), 3, 20);
/// assert_eq!(page.items, vec![41, 42, 43, 44, 45]);
/// assert_eq!(page.total_pages, 3);
/// ```
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);

    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn normalized_query(query: &Option<String>) -> Option<String> {
    query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

// =============================================================================
// Books
// =============================================================================

/// Catalog filter. All set conditions must hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct BookFilter {
    /// Case-insensitive substring over title, author and ISBN.
    pub query: Option<String>,
    /// Exact genre, case-insensitive.
    pub genre: Option<String>,
    /// Only books at or below `low_stock_threshold`.
    pub low_stock_only: bool,
    pub low_stock_threshold: Option<i64>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(q) = normalized_query(&self.query) {
            let isbn_hit = book.isbn.as_deref().is_some_and(|i| {
                contains_ci(i, &q) || contains_ci(&i.replace('-', ""), &q.replace('-', ""))
            });
            if !(contains_ci(&book.title, &q) || contains_ci(&book.author, &q) || isbn_hit) {
                return false;
            }
        }

        if let Some(genre) = self.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            if !book.genre.eq_ignore_ascii_case(genre) {
                return false;
            }
        }

        if self.low_stock_only {
            let threshold = self
                .low_stock_threshold
                .unwrap_or(crate::DEFAULT_LOW_STOCK_THRESHOLD);
            if !book.is_low_stock(threshold) {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BookSort {
    #[default]
    Title,
    Author,
    Price,
    Stock,
    /// By creation time. Ascending means oldest first.
    Newest,
}

/// Sorts in place. Ties fall back to title so output is stable.
pub fn sort_books(books: &mut [Book], sort: BookSort, direction: SortDirection) {
    books.sort_by(|a, b| {
        let primary = match sort {
            BookSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            BookSort::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
            BookSort::Price => a.price_cents.cmp(&b.price_cents),
            BookSort::Stock => a.stock.cmp(&b.stock),
            BookSort::Newest => a.created_at.cmp(&b.created_at),
        };
        direction
            .apply(primary)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });
}

/// Filter, sort and paginate in one call.
pub fn query_books(
    books: &[Book],
    filter: &BookFilter,
    sort: BookSort,
    direction: SortDirection,
    page: usize,
    page_size: usize,
) -> Page<Book> {
    let mut matched: Vec<Book> = books.iter().filter(|b| filter.matches(b)).cloned().collect();
    sort_books(&mut matched, sort, direction);
    paginate(matched, page, page_size)
}

/// Distinct genres, sorted.
pub fn genres(books: &[Book]) -> Vec<String> {
    let mut genres: Vec<String> = books.iter().map(|b| b.genre.clone()).collect();
    genres.sort_by_key(|g| g.to_lowercase());
    genres.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    genres
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CustomerFilter {
    /// Case-insensitive substring over name, email and phone.
    pub query: Option<String>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        let Some(q) = normalized_query(&self.query) else {
            return true;
        };
        contains_ci(&customer.name, &q)
            || contains_ci(&customer.email, &q)
            || customer.phone.as_deref().is_some_and(|p| contains_ci(p, &q))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CustomerSort {
    #[default]
    Name,
    TotalSpent,
    Newest,
}

/// Sorts customers. `stats` supplies purchase totals keyed by customer id;
/// customers without an entry count as zero spent.
pub fn sort_customers(
    customers: &mut [Customer],
    sort: CustomerSort,
    direction: SortDirection,
    stats: &HashMap<String, CustomerStats>,
) {
    let spent = |c: &Customer| stats.get(&c.id).map_or(0, |s| s.total_spent_cents);

    customers.sort_by(|a, b| {
        let primary = match sort {
            CustomerSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            CustomerSort::TotalSpent => spent(a).cmp(&spent(b)),
            CustomerSort::Newest => a.created_at.cmp(&b.created_at),
        };
        direction
            .apply(primary)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

pub fn query_customers(
    customers: &[Customer],
    filter: &CustomerFilter,
    sort: CustomerSort,
    direction: SortDirection,
    stats: &HashMap<String, CustomerStats>,
    page: usize,
    page_size: usize,
) -> Page<Customer> {
    let mut matched: Vec<Customer> = customers
        .iter()
        .filter(|c| filter.matches(c))
        .cloned()
        .collect();
    sort_customers(&mut matched, sort, direction, stats);
    paginate(matched, page, page_size)
}
