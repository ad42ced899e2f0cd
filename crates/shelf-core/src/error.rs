//! # Error Types
//!
//! Domain-specific error types for shelf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelf-core errors (this file)                                         │
//! │  ├── CoreError        - Cart and business rule failures                │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shelf-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  shelf-pos errors                                                      │
//! │  └── ApiError         - What the UI sees (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError ← DbError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Book id is not in the catalog.
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// Customer id is not on file.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Requested cumulative quantity is more than the shelf holds.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// OutOfStock { title: "Dune", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 of Dune in stock"
    /// ```
    #[error("Out of stock for {title}: available {available}, requested {requested}")]
    OutOfStock {
        book_id: String,
        title: String,
        available: i64,
        requested: i64,
    },

    /// Book is not a line in the current draft sale.
    #[error("Book {0} is not in the cart")]
    NotInCart(String),

    /// Checkout attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Amount tendered does not cover the sale total.
    #[error("Insufficient payment: total {total_cents}, paid {paid_cents}")]
    InsufficientPayment { total_cents: i64, paid_cents: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
