//! # API Error Type
//!
//! Unified error type for every command.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shelf POS                              │
//! │                                                                         │
//! │  UI                          Rust Backend                               │
//! │  ──                          ────────────                               │
//! │                                                                         │
//! │  complete_sale(...)                                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Validation?  ValidationError ──► CoreError ──┐                  │  │
//! │  │         │                                     │                  │  │
//! │  │         ▼                                     ▼                  │  │
//! │  │  Database?    sqlx::Error ──► DbError ──────► ApiError ─────────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { code: "OUT_OF_STOCK", message: "Out of stock for Dune: ..." }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried and nothing here is fatal to the process: every
//! failure becomes a value the caller can show.

use serde::Serialize;
use shelf_core::{CoreError, ValidationError};
use shelf_db::DbError;
use ts_rs::TS;

/// Error returned from every command.
///
/// ## Serialization
/// ```json
/// {
///   "code": "DUPLICATE_KEY",
///   "message": "Duplicate isbn: '9780441172719' already exists"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Book, customer, sale or cart line does not exist
    NotFound,

    /// Requested quantity exceeds available stock
    OutOfStock,

    /// Unique constraint hit (ISBN, email)
    DuplicateKey,

    /// Row still referenced elsewhere (book with recorded sales)
    ReferentialConflict,

    /// Caller is not an administrator
    PermissionDenied,

    /// Input rejected before touching storage
    ValidationFailed,

    /// Storage unreachable or a statement failed unexpectedly
    TransportFailure,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationFailed, message)
    }

    fn transport(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::TransportFailure, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::DuplicateKey,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Referential conflict: {}", message);
                ApiError::new(ErrorCode::ReferentialConflict, message)
            }
            DbError::OutOfStock {
                book_id,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::OutOfStock,
                format!(
                    "Out of stock for book {}: {} available, {} requested",
                    book_id, available, requested
                ),
            ),
            DbError::Invalid(e) => ApiError::from(e),
            DbError::PermissionDenied { user_id } => {
                tracing::warn!(user_id = %user_id, "Permission denied");
                ApiError::new(
                    ErrorCode::PermissionDenied,
                    format!("'{}' is not an administrator", user_id),
                )
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::transport("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::transport("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::transport("Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::transport("Database transaction failed")
            }
            DbError::PoolExhausted => ApiError::transport("Database pool exhausted"),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::transport("Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BookNotFound(id) => ApiError::not_found("Book", &id),
            CoreError::CustomerNotFound(id) => ApiError::not_found("Customer", &id),
            CoreError::NotInCart(id) => ApiError::not_found("Cart line", &id),
            e @ CoreError::OutOfStock { .. } => ApiError::new(ErrorCode::OutOfStock, e.to_string()),
            CoreError::InsufficientPayment {
                total_cents,
                paid_cents,
            } => ApiError::validation(format!(
                "insufficient payment: total {} cents, paid {} cents",
                total_cents, paid_cents
            )),
            e @ (CoreError::EmptyCart | CoreError::CartTooLarge { .. }) => {
                ApiError::validation(e.to_string())
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
