//! # shelf-core: Pure Business Logic for Shelf POS
//!
//! Everything in this crate is a pure function or a plain data type: the
//! bookstore's catalog and customer types, the draft-sale cart, money math,
//! input validation, list views and report aggregation. No database, no
//! network, no file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shelf POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI (out of process)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ DTOs (serde / ts-rs)                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shelf-pos commands + stores                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   types   money   cart   validation   query   report           │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shelf-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Customer, Sale, SaleItem, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - The draft sale being rung up
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`query`] - Filter / sort / paginate over in-memory collections
//! - [`report`] - Date-windowed aggregations for the dashboard
//!
//! ## Example Usage
//!
//! ```rust
//! use shelf_core::money::Money;
//! use shelf_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(3000); // $30.00
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(800));
//! assert_eq!(tax.cents(), 240);
//! ```

pub mod cart;
pub mod error;
pub mod money;
pub mod query;
pub mod report;
pub mod types;
pub mod validation;

pub use cart::{CartLine, CartTotals, DraftSale};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

/// Sales tax applied to every sale, in basis points (800 = 8%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 800;

/// Stock level at or below which a book is reported as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum distinct lines allowed in a single draft sale.
pub const MAX_CART_LINES: usize = 100;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Largest book price accepted, in cents ($1,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Largest stock level a book may carry. Manual adjustments are bounded by
/// the same magnitude.
pub const MAX_STOCK: i64 = 1_000_000;
