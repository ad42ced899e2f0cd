//! # Book Commands
//!
//! Catalog maintenance and catalog views.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_book / update_book / adjust_stock                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  validate (shelf-core) ──► repository (shelf-db) ──► catalog.upsert()   │
//! │                                                                         │
//! │  Stock is never written here except through adjust_stock, which is a    │
//! │  single floored UPDATE. Checkout decrements live in sale.rs.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use shelf_core::query::{BookFilter, BookSort, Page, SortDirection};
use shelf_core::validation::{validate_book_update, validate_new_book, validate_search_query};
use shelf_core::{Book, BookUpdate, NewBook};
use tracing::{debug, info};
use ts_rs::TS;

use super::PageRequest;
use crate::error::ApiError;
use crate::state::{CatalogAggregates, CatalogStore, ConfigState, DbState};

/// Catalog list request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct BookQuery {
    pub filter: BookFilter,
    pub sort: BookSort,
    pub direction: SortDirection,
    pub page: PageRequest,
}

/// Reloads the catalog store from the database.
///
/// ## Returns
/// Number of books loaded
pub async fn load_catalog(
    db: &DbState,
    catalog: &CatalogStore,
    user_id: &str,
) -> Result<usize, ApiError> {
    debug!("load_catalog command");
    let session = db.session(user_id).await?;

    let books = session.books().list().await?;
    let count = books.len();
    catalog.replace_all(books);

    info!(count = count, "Catalog loaded");
    Ok(count)
}

/// Filtered, sorted, paginated view of the catalog store.
///
/// A filter without its own low-stock threshold uses the configured one.
pub async fn list_books(
    db: &DbState,
    catalog: &CatalogStore,
    config: &ConfigState,
    user_id: &str,
    query: BookQuery,
) -> Result<Page<Book>, ApiError> {
    debug!(query = ?query.filter.query, genre = ?query.filter.genre, "list_books command");
    db.session(user_id).await?;

    let mut filter = query.filter;
    filter.query = validate_search_query(filter.query.as_deref())?;
    filter
        .low_stock_threshold
        .get_or_insert(config.low_stock_threshold);

    Ok(catalog.query(
        &filter,
        query.sort,
        query.direction,
        query.page.page(),
        query.page.page_size(),
    ))
}

/// Gets a book straight from the database.
pub async fn get_book(db: &DbState, user_id: &str, id: &str) -> Result<Book, ApiError> {
    debug!(id = %id, "get_book command");
    let session = db.session(user_id).await?;
    Ok(session.books().get(id).await?)
}

/// Adds a book to the catalog.
///
/// ## Errors
/// * `VALIDATION_FAILED` - bad title, author, genre, ISBN, price or stock
/// * `DUPLICATE_KEY` - ISBN already in the catalog
pub async fn create_book(
    db: &DbState,
    catalog: &CatalogStore,
    user_id: &str,
    book: NewBook,
) -> Result<Book, ApiError> {
    debug!(title = %book.title, "create_book command");
    validate_new_book(&book)?;
    let session = db.session(user_id).await?;

    let created = session.books().insert(&book).await?;
    catalog.upsert(created.clone());

    info!(id = %created.id, title = %created.title, "Book created");
    Ok(created)
}

/// Updates details and price. Stock is untouched.
pub async fn update_book(
    db: &DbState,
    catalog: &CatalogStore,
    user_id: &str,
    id: &str,
    update: BookUpdate,
) -> Result<Book, ApiError> {
    debug!(id = %id, "update_book command");
    validate_book_update(&update)?;
    let session = db.session(user_id).await?;

    let updated = session.books().update(id, &update).await?;
    catalog.upsert(updated.clone());

    info!(id = %id, "Book updated");
    Ok(updated)
}

/// Manual stock correction. The stored stock becomes `max(0, stock + delta)`.
pub async fn adjust_stock(
    db: &DbState,
    catalog: &CatalogStore,
    user_id: &str,
    id: &str,
    delta: i64,
) -> Result<Book, ApiError> {
    debug!(id = %id, delta = delta, "adjust_stock command");
    let session = db.session(user_id).await?;

    let books = session.books();
    let stock = books.adjust_stock(id, delta).await?;
    let book = books.get(id).await?;
    catalog.upsert(book.clone());

    info!(id = %id, delta = delta, stock = stock, "Stock adjusted");
    Ok(book)
}

/// Deletes a book that has never been sold.
///
/// ## Errors
/// * `REFERENTIAL_CONFLICT` - the book appears on a recorded sale
pub async fn delete_book(
    db: &DbState,
    catalog: &CatalogStore,
    user_id: &str,
    id: &str,
) -> Result<(), ApiError> {
    debug!(id = %id, "delete_book command");
    let session = db.session(user_id).await?;

    session.books().delete(id).await?;
    catalog.remove(id);

    info!(id = %id, "Book deleted");
    Ok(())
}

pub async fn get_catalog_aggregates(
    db: &DbState,
    catalog: &CatalogStore,
    config: &ConfigState,
    user_id: &str,
) -> Result<CatalogAggregates, ApiError> {
    debug!("get_catalog_aggregates command");
    db.session(user_id).await?;
    Ok(catalog.aggregates(config.low_stock_threshold))
}

pub async fn list_genres(
    db: &DbState,
    catalog: &CatalogStore,
    user_id: &str,
) -> Result<Vec<String>, ApiError> {
    debug!("list_genres command");
    db.session(user_id).await?;
    Ok(catalog.genres())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{TestApp, ADMIN};
    use crate::error::ErrorCode;

    fn new_book(title: &str, isbn: Option<&str>) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Frank Herbert".to_string(),
            isbn: isbn.map(str::to_string),
            genre: "Science Fiction".to_string(),
            price_cents: 1099,
            stock: 4,
        }
    }

    #[tokio::test]
    async fn test_create_book_updates_store() {
        let app = TestApp::new().await;
        let book = create_book(&app.db, &app.catalog, ADMIN, new_book("Dune", None))
            .await
            .unwrap();

        assert_eq!(app.catalog.get(&book.id), Some(book.clone()));
        assert_eq!(get_book(&app.db, ADMIN, &book.id).await.unwrap(), book);
    }

    #[tokio::test]
    async fn test_create_book_rejects_invalid_input() {
        let app = TestApp::new().await;
        let mut book = new_book("  ", None);
        book.price_cents = -1;

        let err = create_book(&app.db, &app.catalog, ADMIN, book)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(app.catalog.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_isbn_is_duplicate_key() {
        let app = TestApp::new().await;
        create_book(&app.db, &app.catalog, ADMIN, new_book("Dune", Some("9780441172719")))
            .await
            .unwrap();

        let err = create_book(
            &app.db,
            &app.catalog,
            ADMIN,
            new_book("Dune (again)", Some("978-0-441-17271-9")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateKey);
        assert_eq!(app.catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_non_admin_is_denied() {
        let app = TestApp::new().await;
        let err = create_book(&app.db, &app.catalog, "clerk", new_book("Dune", None))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(app.catalog.is_empty());
    }

    #[tokio::test]
    async fn test_adjust_stock_floors_at_zero() {
        let app = TestApp::new().await;
        let book = app.add_book("Emma", 800, 4).await;

        let up = adjust_stock(&app.db, &app.catalog, ADMIN, &book.id, 6)
            .await
            .unwrap();
        assert_eq!(up.stock, 10);

        let down = adjust_stock(&app.db, &app.catalog, ADMIN, &book.id, -25)
            .await
            .unwrap();
        assert_eq!(down.stock, 0);
        assert_eq!(app.catalog.get(&book.id).unwrap().stock, 0);

        let err = adjust_stock(&app.db, &app.catalog, ADMIN, "missing", 1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_huge_stock_adjustment_is_rejected() {
        let app = TestApp::new().await;
        let book = app.add_book("Emma", 800, 4).await;

        let err = adjust_stock(&app.db, &app.catalog, ADMIN, &book.id, i64::MAX)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        // Book still loads everywhere
        assert_eq!(get_book(&app.db, ADMIN, &book.id).await.unwrap().stock, 4);
        assert_eq!(load_catalog(&app.db, &app.catalog, ADMIN).await.unwrap(), 1);
        assert_eq!(app.catalog.get(&book.id).unwrap().stock, 4);
    }

    #[tokio::test]
    async fn test_price_and_stock_ceilings() {
        let app = TestApp::new().await;

        let mut book = new_book("Dune", None);
        book.price_cents = i64::MAX;
        let err = create_book(&app.db, &app.catalog, ADMIN, book)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let mut book = new_book("Dune", None);
        book.stock = shelf_core::MAX_STOCK + 1;
        let err = create_book(&app.db, &app.catalog, ADMIN, book)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(app.catalog.is_empty());
    }

    #[tokio::test]
    async fn test_list_books_search_is_trimmed_and_bounded() {
        let app = TestApp::new().await;
        app.add_book("Dune", 1000, 2).await;
        app.add_book("Emma", 1000, 2).await;

        let mut query = BookQuery::default();
        query.filter.query = Some("  dune ".to_string());
        let page = list_books(&app.db, &app.catalog, &app.config, ADMIN, query)
            .await
            .unwrap();
        assert_eq!(page.total_items, 1);

        let mut query = BookQuery::default();
        query.filter.query = Some("x".repeat(101));
        let err = list_books(&app.db, &app.catalog, &app.config, ADMIN, query)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_update_keeps_stock() {
        let app = TestApp::new().await;
        let book = app.add_book("Emma", 800, 4).await;

        let updated = update_book(
            &app.db,
            &app.catalog,
            ADMIN,
            &book.id,
            BookUpdate {
                title: "Emma".to_string(),
                author: "Jane Austen".to_string(),
                isbn: None,
                genre: "Classics".to_string(),
                price_cents: 950,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.price_cents, 950);
        assert_eq!(updated.stock, 4);
        assert_eq!(app.catalog.get(&book.id).unwrap().author, "Jane Austen");
    }

    #[tokio::test]
    async fn test_delete_and_reload() {
        let app = TestApp::new().await;
        let keep = app.add_book("Beloved", 1200, 2).await;
        let gone = app.add_book("Ariel", 900, 1).await;

        delete_book(&app.db, &app.catalog, ADMIN, &gone.id)
            .await
            .unwrap();
        assert!(app.catalog.get(&gone.id).is_none());

        app.catalog.replace_all(Vec::new());
        assert_eq!(load_catalog(&app.db, &app.catalog, ADMIN).await.unwrap(), 1);
        assert!(app.catalog.get(&keep.id).is_some());
    }

    #[tokio::test]
    async fn test_list_books_uses_configured_threshold() {
        let app = TestApp::new().await;
        app.add_book("Plenty", 1000, 20).await;
        app.add_book("Few", 1000, 3).await;
        app.add_book("None Left", 1000, 0).await;

        let query = BookQuery {
            filter: BookFilter {
                low_stock_only: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let page = list_books(&app.db, &app.catalog, &app.config, ADMIN, query)
            .await
            .unwrap();

        let titles: Vec<&str> = page.items.iter().map(|b| b.title.as_str()).collect();
        assert!(titles.contains(&"Few"));
        assert!(!titles.contains(&"Plenty"));

        let agg = get_catalog_aggregates(&app.db, &app.catalog, &app.config, ADMIN)
            .await
            .unwrap();
        assert_eq!(agg.title_count, 3);
        assert_eq!(agg.out_of_stock_count, 1);
        assert_eq!(
            list_genres(&app.db, &app.catalog, ADMIN).await.unwrap(),
            vec!["Fiction".to_string()]
        );
    }
}
