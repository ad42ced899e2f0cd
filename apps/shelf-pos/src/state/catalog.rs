//! # Catalog Store
//!
//! In-memory copy of the book catalog, refreshed from the database after
//! every write that touches books.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog Store                                        │
//! │                                                                         │
//! │  load_catalog ──► replace_all(books)                                    │
//! │  create/update ──► upsert(book)          ┌─────────────────────────┐    │
//! │  adjust_stock  ──► upsert(book)     ───► │  RwLock<Vec<Book>>      │    │
//! │  complete_sale ──► upsert(each line)     └────────────┬────────────┘    │
//! │  delete_book   ──► remove(id)                         │                 │
//! │                                                       ▼                 │
//! │                            query() / aggregates() / inventory()        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock shown here is a view. The database row is the only authority, and
//! checkout decrements it conditionally no matter what this store says.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use shelf_core::query::{self, BookFilter, BookSort, Page, SortDirection};
use shelf_core::report::{self, InventorySnapshot};
use shelf_core::{Book, Money};
use ts_rs::TS;

/// Headline numbers for the catalog screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAggregates {
    pub title_count: usize,
    pub total_units: i64,
    pub inventory_value_cents: i64,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
}

#[derive(Debug, Default)]
pub struct CatalogStore {
    books: RwLock<Vec<Book>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&self, books: Vec<Book>) {
        *self.write() = books;
    }

    /// Inserts or replaces by id.
    pub fn upsert(&self, book: Book) {
        let mut books = self.write();
        match books.iter_mut().find(|b| b.id == book.id) {
            Some(existing) => *existing = book,
            None => books.push(book),
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut books = self.write();
        let before = books.len();
        books.retain(|b| b.id != id);
        books.len() != before
    }

    pub fn get(&self, id: &str) -> Option<Book> {
        self.read().iter().find(|b| b.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Book> {
        self.read().clone()
    }

    /// Runs `f` against the current books without cloning them.
    pub fn with_books<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[Book]) -> R,
    {
        let books = self.read();
        f(&books)
    }

    pub fn query(
        &self,
        filter: &BookFilter,
        sort: BookSort,
        direction: SortDirection,
        page: usize,
        page_size: usize,
    ) -> Page<Book> {
        self.with_books(|books| query::query_books(books, filter, sort, direction, page, page_size))
    }

    pub fn genres(&self) -> Vec<String> {
        self.with_books(query::genres)
    }

    pub fn inventory(&self, low_stock_threshold: i64) -> InventorySnapshot {
        self.with_books(|books| report::inventory_snapshot(books, low_stock_threshold))
    }

    pub fn aggregates(&self, low_stock_threshold: i64) -> CatalogAggregates {
        self.with_books(|books| CatalogAggregates {
            title_count: books.len(),
            total_units: books.iter().map(|b| b.stock).sum(),
            inventory_value_cents: books.iter().map(Book::stock_value).sum::<Money>().cents(),
            low_stock_count: books
                .iter()
                .filter(|b| b.stock > 0 && b.is_low_stock(low_stock_threshold))
                .count(),
            out_of_stock_count: books.iter().filter(|b| b.stock == 0).count(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Book>> {
        self.books.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Book>> {
        self.books.write().unwrap_or_else(PoisonError::into_inner)
    }
}
