//! # shelf-db: Database Layer for Shelf POS
//!
//! SQLite storage through sqlx: the pool, embedded migrations, the
//! administrator gate and the repositories.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shelf POS Data Flow                              │
//! │                                                                         │
//! │  shelf-pos command (complete_sale)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     shelf-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BookRepo      │    │ 001_schema   │  │   │
//! │  │   │ session() ────┼───►│ CustomerRepo  │    │ 002_indexes  │  │   │
//! │  │   │ AdminSession  │    │ SaleRepo      │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir, or SHELF_DB_PATH)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelf_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("shelf.db")).await?;
//! let session = db.session("manager").await?;
//! let books = session.books().list().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{AdminSession, Database, DbConfig};

pub use repository::book::BookRepository;
pub use repository::customer::CustomerRepository;
pub use repository::sale::{NewSale, NewSaleLine, SaleRepository};
