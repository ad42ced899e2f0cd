//! # State Module
//!
//! Explicit state objects handed to every command.
//!
//! Each command names exactly the state it touches, so there is no global
//! store and tests build only what they need.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   DbState    │  │  CartState   │  │   ConfigState    │              │
//! │  │  Database    │  │  Arc<Mutex<  │  │  store_name      │              │
//! │  │  (SQLite     │  │  DraftSale>> │  │  tax_rate        │              │
//! │  │   pool)      │  │              │  │  low_stock       │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │ CatalogStore │  │CustomerStore │  │   SalesLedger    │              │
//! │  │ RwLock<      │  │ RwLock<      │  │  RwLock<         │              │
//! │  │  Vec<Book>>  │  │ Vec<Customer>│  │  Vec<SaleRecord>>│              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │         ▲                  ▲                  ▲                        │
//! │         └──────── refreshed from shelf-db after each write ──┘         │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • CartState: Arc<Mutex<T>> for exclusive access                       │
//! │  • Stores: RwLock, many readers or one writer                          │
//! │  • ConfigState: Read-only after initialization                         │
//! │  No lock is ever held across an `.await`.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod catalog;
mod config;
mod customers;
mod db;
mod ledger;

pub use cart::CartState;
pub use catalog::{CatalogAggregates, CatalogStore};
pub use config::ConfigState;
pub use customers::CustomerStore;
pub use db::DbState;
pub use ledger::SalesLedger;
