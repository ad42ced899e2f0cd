//! # Book Repository
//!
//! Catalog rows and stock levels.
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ read stock, compute, write back (two sales can both "see" 1)   │
//! │                                                                     │
//! │  ✅ manual correction, one statement:                               │
//! │     UPDATE books SET stock = MAX(0, stock + ?delta) ... RETURNING   │
//! │                                                                     │
//! │  ✅ checkout (inside the sale transaction, see sale.rs):            │
//! │     UPDATE books SET stock = stock - ?qty                           │
//! │     WHERE id = ? AND stock >= ?qty       -- 0 rows ⇒ OutOfStock     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::blank_to_none;
use crate::error::{DbError, DbResult};
use shelf_core::validation::{normalize_isbn, validate_stock_delta};
use shelf_core::{Book, BookUpdate, NewBook, ValidationError, MAX_STOCK};

const BOOK_COLUMNS: &str =
    "id, title, author, isbn, genre, price_cents, stock, created_at, updated_at";

/// Repository for book database operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Inserts a validated book.
    ///
    /// ## Returns
    /// * `Ok(Book)` - with generated id and timestamps
    /// * `Err(DbError::UniqueViolation)` - ISBN already in the catalog
    pub async fn insert(&self, book: &NewBook) -> DbResult<Book> {
        let isbn = blank_to_none(book.isbn.as_deref()).map(|i| normalize_isbn(&i));
        let now = Utc::now();
        let created = Book {
            id: Uuid::new_v4().to_string(),
            title: book.title.trim().to_string(),
            author: book.author.trim().to_string(),
            isbn,
            genre: book.genre.trim().to_string(),
            price_cents: book.price_cents,
            stock: book.stock,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %created.id, title = %created.title, "Inserting book");

        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, isbn, genre,
                price_cents, stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&created.id)
        .bind(&created.title)
        .bind(&created.author)
        .bind(&created.isbn)
        .bind(&created.genre)
        .bind(created.price_cents)
        .bind(created.stock)
        .bind(created.created_at)
        .bind(created.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(created.isbn.as_deref()))?;

        info!(id = %created.id, stock = created.stock, "Book added");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Like [`get_by_id`](Self::get_by_id) but a missing row is an error.
    pub async fn get(&self, id: &str) -> DbResult<Book> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Book", id))
    }

    /// All books, by title.
    pub async fn list(&self) -> DbResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY title COLLATE NOCASE, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = books.len(), "Listed books");
        Ok(books)
    }

    /// Updates details and price. Stock is untouched.
    pub async fn update(&self, id: &str, update: &BookUpdate) -> DbResult<Book> {
        debug!(id = %id, "Updating book");

        let isbn = blank_to_none(update.isbn.as_deref()).map(|i| normalize_isbn(&i));

        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                title = ?2,
                author = ?3,
                isbn = ?4,
                genre = ?5,
                price_cents = ?6,
                updated_at = ?7
            WHERE id = ?1
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.title.trim())
        .bind(update.author.trim())
        .bind(&isbn)
        .bind(update.genre.trim())
        .bind(update.price_cents)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(isbn.as_deref()))?
        .ok_or_else(|| DbError::not_found("Book", id))?;

        Ok(book)
    }

    /// Applies a manual stock correction and returns the new level.
    ///
    /// The result is floored at zero in the same statement. A delta outside
    /// `±MAX_STOCK`, or one that would lift stock past `MAX_STOCK`, is
    /// rejected with `DbError::Invalid` and nothing is written.
    ///
    /// ## Example
    /// ```rust,ignore
    /// // stock 3
    /// assert_eq!(repo.adjust_stock(id, -5).await?, 0);
    /// assert_eq!(repo.adjust_stock(id, 12).await?, 12);
    /// ```
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<i64> {
        debug!(id = %id, delta = delta, "Adjusting stock");
        validate_stock_delta(delta)?;

        // stock and delta are both bounded by MAX_STOCK, so the sum stays an
        // INTEGER in SQLite
        let stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET stock = MAX(0, stock + ?2),
                updated_at = ?3
            WHERE id = ?1 AND stock + ?2 <= ?4
            RETURNING stock
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .bind(MAX_STOCK)
        .fetch_optional(&self.pool)
        .await?;

        let Some(stock) = stock else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?1)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(DbError::not_found("Book", id));
            }
            warn!(id = %id, delta = delta, "Stock adjustment would exceed the maximum");
            return Err(DbError::Invalid(ValidationError::OutOfRange {
                field: "stock".to_string(),
                min: 0,
                max: MAX_STOCK,
            }));
        };

        info!(id = %id, delta = delta, stock = stock, "Stock adjusted");
        Ok(stock)
    }

    /// Deletes a book with no sales history.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - sale items reference it
    /// * `Err(DbError::NotFound)` - no such book
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting book");

        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => DbError::ForeignKeyViolation {
                    message: format!("book {} has recorded sales and cannot be deleted", id),
                },
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", id));
        }

        info!(id = %id, "Book deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Conditional checkout decrement inside the sale transaction.
///
/// ## Returns
/// * `Err(DbError::OutOfStock)` - fewer than `quantity` units persisted
/// * `Err(DbError::NotFound)` - no such book
pub(crate) async fn decrement_in(
    tx: &mut Transaction<'_, Sqlite>,
    id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE books
        SET stock = stock - ?2,
            updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 1 {
        debug!(id = %id, quantity = quantity, "Stock decremented");
        return Ok(());
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM books WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

    Err(match available {
        Some(available) => DbError::OutOfStock {
            book_id: id.to_string(),
            available,
            requested: quantity,
        },
        None => DbError::not_found("Book", id),
    })
}
