//! # Commands Module
//!
//! Every operation a UI can call. Commands are plain functions: they take
//! the state objects they need by reference, return `Result<T, ApiError>`,
//! and `T` is always `Serialize`.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── book.rs      ◄─── Catalog CRUD, stock adjustment, catalog queries
//! ├── customer.rs  ◄─── Customer CRUD and purchase history
//! ├── cart.rs      ◄─── Draft sale manipulation
//! ├── sale.rs      ◄─── Checkout, receipts, sales history
//! ├── report.rs    ◄─── Dashboard and report views
//! └── config.rs    ◄─── Configuration retrieval
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  UI                                                                     │
//! │  ──                                                                     │
//! │  complete_sale(user_id, { amountPaidCents: 3000 })                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Rust Backend                                                           │
//! │  ────────────                                                           │
//! │  async fn complete_sale(                                                │
//! │      db: &DbState,            ◄── admin check + persistence            │
//! │      cart: &CartState,        ◄── draft being completed                │
//! │      catalog: &CatalogStore,  ◄── refreshed after commit               │
//! │      ledger: &SalesLedger,    ◄── receives the new sale                │
//! │      ...                                                                │
//! │  ) -> Result<Receipt, ApiError>                                         │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  UI receives: Receipt                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authorization
//! Every command that reads or writes the database starts with
//! `db.session(user_id)`. Cart commands touch only process-local state and
//! skip it.

pub mod book;
pub mod cart;
pub mod config;
pub mod customer;
pub mod report;
pub mod sale;

use serde::{Deserialize, Serialize};
use shelf_core::query::DEFAULT_PAGE_SIZE;
use ts_rs::TS;

/// Page request shared by the list commands. Missing fields mean page 1
/// of the default size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PageRequest {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory application wired the way `lib.rs` wires the real one.

    use shelf_core::{Book, NewBook};
    use shelf_db::{Database, DbConfig};

    use crate::state::{CartState, CatalogStore, ConfigState, CustomerStore, DbState, SalesLedger};

    pub const ADMIN: &str = "manager";

    pub struct TestApp {
        pub db: DbState,
        pub cart: CartState,
        pub catalog: CatalogStore,
        pub customers: CustomerStore,
        pub ledger: SalesLedger,
        pub config: ConfigState,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let db = Database::new(DbConfig::in_memory()).await.unwrap();
            db.grant_admin(ADMIN).await.unwrap();
            let config = ConfigState::default();

            TestApp {
                db: DbState::new(db),
                cart: CartState::new(config.tax_rate()),
                catalog: CatalogStore::new(),
                customers: CustomerStore::new(),
                ledger: SalesLedger::new(),
                config,
            }
        }

        pub async fn add_book(&self, title: &str, price_cents: i64, stock: i64) -> Book {
            super::book::create_book(
                &self.db,
                &self.catalog,
                ADMIN,
                NewBook {
                    title: title.to_string(),
                    author: "Test Author".to_string(),
                    isbn: None,
                    genre: "Fiction".to_string(),
                    price_cents,
                    stock,
                },
            )
            .await
            .unwrap()
        }
    }
}
