//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← constraint classification, entity context     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (shelf-pos) ← { code, message } for the UI                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shelf_core::ValidationError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (`books.isbn`, `customers.email`).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a book that has sale items (RESTRICT)
    /// - Referencing a missing sale or book from a sale item
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Conditional stock decrement found fewer units than requested.
    /// The surrounding checkout transaction has been rolled back.
    #[error("Out of stock for book {book_id}: available {available}, requested {requested}")]
    OutOfStock {
        book_id: String,
        available: i64,
        requested: i64,
    },

    /// Input rejected before reaching SQLite (for example a stock
    /// adjustment outside the allowed range).
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Caller is not in `admin_users`.
    #[error("User '{user_id}' is not an administrator")]
    PermissionDenied { user_id: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Runtime SQL error, including CHECK constraint failures.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (acquire timed out).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Fills in the offending value of a UniqueViolation that came back
    /// from SQLite without one. Other errors pass through.
    pub(crate) fn with_duplicate_value(self, value: Option<&str>) -> Self {
        match (self, value) {
            (DbError::UniqueViolation { field, .. }, Some(value)) => DbError::UniqueViolation {
                field,
                value: value.to_string(),
            },
            (err, _) => err,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → UNIQUE / FOREIGN KEY by message, else QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: books.isbn"
                if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    let field = columns
                        .split(',')
                        .next()
                        .and_then(|c| c.trim().rsplit('.').next())
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
