//! # Sale Repository
//!
//! Checkout persistence and sales history.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   record_checkout (ONE transaction)                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── walk-in customer?  INSERT INTO customers                          │
//! │   │   existing customer? must exist, else NotFound                      │
//! │   ├── INSERT INTO sales (header, totals frozen from the draft)          │
//! │   ├── for each line:                                                    │
//! │   │     UPDATE books SET stock = stock - qty                            │
//! │   │       WHERE id = ? AND stock >= qty   ── 0 rows ──► OutOfStock      │
//! │   │     INSERT INTO sale_items                                          │
//! │   └── SELECT the sale back with titles / authors / customer name        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error ──► ROLLBACK: no header, no items, no decrements             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::query::QueryAs;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{blank_to_none, book, customer};
use crate::error::{DbError, DbResult};
use shelf_core::{DraftSale, NewCustomer, PaymentMethod, Sale, SaleLine, SaleRecord, SaleStatus};

// =============================================================================
// Checkout Input
// =============================================================================

/// One line of a checkout, price already frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleLine {
    pub book_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Everything the checkout transaction writes.
///
/// Built from the draft at the moment of completion with
/// [`NewSale::from_draft`], so the persisted totals equal the draft's.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer_id: Option<String>,
    /// Walk-in customer created inside the checkout transaction. Takes
    /// precedence over `customer_id`.
    pub new_customer: Option<NewCustomer>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub lines: Vec<NewSaleLine>,
}

impl NewSale {
    pub fn from_draft(draft: &DraftSale) -> Self {
        let totals = draft.totals();
        NewSale {
            customer_id: draft.customer_id().map(str::to_string),
            new_customer: None,
            payment_method: draft.payment_method(),
            notes: draft.notes().map(str::to_string),
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            lines: draft
                .lines()
                .iter()
                .map(|l| NewSaleLine {
                    book_id: l.book_id.clone(),
                    quantity: l.quantity,
                    unit_price_cents: l.unit_price_cents,
                })
                .collect(),
        }
    }

    pub fn with_new_customer(mut self, customer: NewCustomer) -> Self {
        self.new_customer = Some(customer);
        self
    }
}

// =============================================================================
// History Filters
// =============================================================================

/// Which sales a history query returns. SQL is static, binds are owned.
#[derive(Debug, Clone, Copy)]
enum SaleFilter<'a> {
    All,
    Id(&'a str),
    Between(DateTime<Utc>, DateTime<Utc>),
    Customer(&'a str),
}

macro_rules! sales_sql {
    ($where:literal) => {
        concat!(
            "SELECT s.id, s.customer_id, s.subtotal_cents, s.tax_cents, s.discount_cents, ",
            "s.total_cents, s.payment_method, s.status, s.notes, s.created_at, ",
            "c.name AS customer_name ",
            "FROM sales s LEFT JOIN customers c ON c.id = s.customer_id ",
            "WHERE ",
            $where,
            " ORDER BY s.created_at, s.id"
        )
    };
}

macro_rules! lines_sql {
    ($where:literal) => {
        concat!(
            "SELECT si.id, si.sale_id, si.book_id, b.title, b.author, b.genre, ",
            "si.quantity, si.unit_price_cents, si.line_total_cents ",
            "FROM sale_items si ",
            "JOIN sales s ON s.id = si.sale_id ",
            "JOIN books b ON b.id = si.book_id ",
            "WHERE ",
            $where,
            " ORDER BY si.rowid"
        )
    };
}

impl SaleFilter<'_> {
    fn sales_sql(&self) -> &'static str {
        match self {
            SaleFilter::All => sales_sql!("1 = 1"),
            SaleFilter::Id(_) => sales_sql!("s.id = ?1"),
            SaleFilter::Between(..) => sales_sql!("s.created_at >= ?1 AND s.created_at < ?2"),
            SaleFilter::Customer(_) => sales_sql!("s.customer_id = ?1"),
        }
    }

    fn lines_sql(&self) -> &'static str {
        match self {
            SaleFilter::All => lines_sql!("1 = 1"),
            SaleFilter::Id(_) => lines_sql!("s.id = ?1"),
            SaleFilter::Between(..) => lines_sql!("s.created_at >= ?1 AND s.created_at < ?2"),
            SaleFilter::Customer(_) => lines_sql!("s.customer_id = ?1"),
        }
    }

    fn bind<O>(
        &self,
        query: QueryAs<'static, Sqlite, O, SqliteArguments<'static>>,
    ) -> QueryAs<'static, Sqlite, O, SqliteArguments<'static>> {
        match *self {
            SaleFilter::All => query,
            SaleFilter::Id(id) | SaleFilter::Customer(id) => query.bind(id.to_string()),
            SaleFilter::Between(start, end) => query.bind(start).bind(end),
        }
    }
}

#[derive(sqlx::FromRow)]
struct SaleRow {
    #[sqlx(flatten)]
    sale: Sale,
    customer_name: Option<String>,
}

/// Loads headers then lines for `filter` on one connection.
async fn load_records(conn: &mut SqliteConnection, filter: SaleFilter<'_>) -> DbResult<Vec<SaleRecord>> {
    let rows: Vec<SaleRow> = filter
        .bind(sqlx::query_as::<_, SaleRow>(filter.sales_sql()))
        .fetch_all(&mut *conn)
        .await?;

    let lines: Vec<SaleLine> = filter
        .bind(sqlx::query_as::<_, SaleLine>(filter.lines_sql()))
        .fetch_all(&mut *conn)
        .await?;

    let mut by_sale: HashMap<String, Vec<SaleLine>> = HashMap::new();
    for line in lines {
        by_sale.entry(line.sale_id.clone()).or_default().push(line);
    }

    Ok(rows
        .into_iter()
        .map(|row| SaleRecord {
            lines: by_sale.remove(&row.sale.id).unwrap_or_default(),
            customer_name: row.customer_name,
            sale: row.sale,
        })
        .collect())
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Persists a completed sale atomically and returns it materialized.
    ///
    /// ## Returns
    /// * `Ok(SaleRecord)` - committed; stock decremented for every line
    /// * `Err(DbError::OutOfStock)` - a line exceeded persisted stock
    /// * `Err(DbError::NotFound)` - unknown book or customer
    /// * `Err(DbError::UniqueViolation)` - walk-in customer email taken
    ///
    /// Nothing is written on error.
    pub async fn record_checkout(&self, new_sale: &NewSale) -> DbResult<SaleRecord> {
        if new_sale.lines.is_empty() {
            return Err(DbError::TransactionFailed(
                "checkout has no line items".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        match checkout_in(&mut tx, new_sale).await {
            Ok(record) => {
                tx.commit().await?;
                info!(
                    sale_id = %record.sale.id,
                    total_cents = record.sale.total_cents,
                    lines = record.lines.len(),
                    "Sale recorded"
                );
                Ok(record)
            }
            Err(err) => {
                warn!(error = %err, "Checkout rolled back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<SaleRecord>> {
        let mut conn = self.pool.acquire().await?;
        let mut records = load_records(&mut conn, SaleFilter::Id(id)).await?;
        Ok(records.pop())
    }

    /// Sales with `start <= created_at < end`, oldest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<SaleRecord>> {
        debug!(%start, %end, "Listing sales in range");
        let mut conn = self.pool.acquire().await?;
        load_records(&mut conn, SaleFilter::Between(start, end)).await
    }

    /// Entire history, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<SaleRecord>> {
        let mut conn = self.pool.acquire().await?;
        load_records(&mut conn, SaleFilter::All).await
    }

    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<SaleRecord>> {
        let mut conn = self.pool.acquire().await?;
        load_records(&mut conn, SaleFilter::Customer(customer_id)).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn checkout_in(tx: &mut Transaction<'_, Sqlite>, new_sale: &NewSale) -> DbResult<SaleRecord> {
    let customer_id = match (&new_sale.new_customer, &new_sale.customer_id) {
        (Some(walk_in), _) => Some(customer::insert_in(tx, walk_in).await?.id),
        (None, Some(id)) => {
            if !customer::exists_in(tx, id).await? {
                return Err(DbError::not_found("Customer", id.as_str()));
            }
            Some(id.clone())
        }
        (None, None) => None,
    };

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        customer_id,
        subtotal_cents: new_sale.subtotal_cents,
        tax_cents: new_sale.tax_cents,
        discount_cents: new_sale.discount_cents,
        total_cents: new_sale.total_cents,
        payment_method: new_sale.payment_method,
        status: SaleStatus::Completed,
        notes: blank_to_none(new_sale.notes.as_deref()),
        created_at: Utc::now(),
    };

    debug!(sale_id = %sale.id, lines = new_sale.lines.len(), "Inserting sale header");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, customer_id, subtotal_cents, tax_cents, discount_cents,
            total_cents, payment_method, status, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.customer_id)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .execute(&mut **tx)
    .await?;

    for line in &new_sale.lines {
        book::decrement_in(tx, &line.book_id, line.quantity).await?;

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, book_id, quantity, unit_price_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&sale.id)
        .bind(&line.book_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.quantity * line.unit_price_cents)
        .execute(&mut **tx)
        .await?;
    }

    load_records(&mut **tx, SaleFilter::Id(&sale.id))
        .await?
        .pop()
        .ok_or_else(|| DbError::TransactionFailed(format!("sale {} vanished before commit", sale.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdminSession, Database, DbConfig};
    use chrono::Duration;
    use shelf_core::{Book, NewBook, TaxRate};

    async fn session() -> AdminSession {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.grant_admin("admin").await.unwrap();
        db.session("admin").await.unwrap()
    }

    async fn add_book(session: &AdminSession, title: &str, price_cents: i64, stock: i64) -> Book {
        session
            .books()
            .insert(&NewBook {
                title: title.to_string(),
                author: "Octavia E. Butler".to_string(),
                isbn: None,
                genre: "Science Fiction".to_string(),
                price_cents,
                stock,
            })
            .await
            .unwrap()
    }

    fn draft(lines: &[(&Book, i64)]) -> DraftSale {
        let mut draft = DraftSale::new(TaxRate::from_bps(800));
        for (book, qty) in lines {
            draft.add_item(book, *qty).unwrap();
        }
        draft
    }

    #[tokio::test]
    async fn test_checkout_persists_and_decrements() {
        let session = session().await;
        let b1 = add_book(&session, "Kindred", 1000, 10).await;

        let mut cart = draft(&[(&b1, 3)]);
        cart.set_discount(10.0);
        cart.set_payment_method(PaymentMethod::Card);
        cart.set_notes(Some("gift".to_string()));

        let record = session
            .sales()
            .record_checkout(&NewSale::from_draft(&cart))
            .await
            .unwrap();

        assert_eq!(record.sale.subtotal_cents, 3000);
        assert_eq!(record.sale.discount_cents, 300);
        assert_eq!(record.sale.tax_cents, 240);
        assert_eq!(record.sale.total_cents, 2940);
        assert!(record.sale.totals_consistent());
        assert_eq!(record.sale.payment_method, PaymentMethod::Card);
        assert_eq!(record.sale.notes.as_deref(), Some("gift"));
        assert_eq!(record.lines.len(), 1);
        assert_eq!(record.lines[0].title, "Kindred");
        assert_eq!(record.lines[0].line_total_cents, 3000);

        assert_eq!(session.books().get(&b1.id).await.unwrap().stock, 7);
        assert_eq!(session.sales().get(&record.sale.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_two_sequential_sales() {
        let session = session().await;
        let b = add_book(&session, "Dawn", 1500, 5).await;

        session
            .sales()
            .record_checkout(&NewSale::from_draft(&draft(&[(&b, 2)])))
            .await
            .unwrap();
        session
            .sales()
            .record_checkout(&NewSale::from_draft(&draft(&[(&b, 3)])))
            .await
            .unwrap();

        assert_eq!(session.books().get(&b.id).await.unwrap().stock, 0);
        assert_eq!(session.sales().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_out_of_stock_rolls_back_everything() {
        let session = session().await;
        let plenty = add_book(&session, "Wild Seed", 800, 10).await;
        let scarce = add_book(&session, "Fledgling", 900, 2).await;

        // draft built while stock was 2, then the shelf was corrected
        let cart = draft(&[(&plenty, 4), (&scarce, 2)]);
        session.books().adjust_stock(&scarce.id, -1).await.unwrap();

        let err = session
            .sales()
            .record_checkout(&NewSale::from_draft(&cart))
            .await
            .unwrap_err();
        match err {
            DbError::OutOfStock {
                book_id,
                available,
                requested,
            } => {
                assert_eq!(book_id, scarce.id);
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("expected OutOfStock, got {other:?}"),
        }

        assert_eq!(session.books().get(&plenty.id).await.unwrap().stock, 10);
        assert_eq!(session.books().get(&scarce.id).await.unwrap().stock, 1);
        assert_eq!(session.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_sales_for_last_unit() {
        let session = session().await;
        let b = add_book(&session, "Parable of the Sower", 1200, 1).await;

        let sale = NewSale::from_draft(&draft(&[(&b, 1)]));
        let repo_a = session.sales();
        let repo_b = session.sales();
        let (a, b_res) = tokio::join!(repo_a.record_checkout(&sale), repo_b.record_checkout(&sale));

        assert_eq!(a.is_ok() as u8 + b_res.is_ok() as u8, 1);
        assert!(matches!(a.err().or(b_res.err()), Some(DbError::OutOfStock { .. })));
        assert_eq!(session.books().get(&b.id).await.unwrap().stock, 0);
        assert_eq!(session.sales().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_walk_in_customer_created_with_sale() {
        let session = session().await;
        let b = add_book(&session, "Lilith's Brood", 2000, 3).await;

        let sale = NewSale::from_draft(&draft(&[(&b, 1)])).with_new_customer(NewCustomer {
            name: "Walk In".to_string(),
            email: "walkin@example.com".to_string(),
            phone: None,
            address: None,
        });
        let record = session.sales().record_checkout(&sale).await.unwrap();

        assert_eq!(record.customer_name.as_deref(), Some("Walk In"));
        let customer_id = record.sale.customer_id.clone().unwrap();
        assert_eq!(
            session.sales().list_for_customer(&customer_id).await.unwrap().len(),
            1
        );

        // same email again: the whole checkout fails, stock untouched
        let err = session.sales().record_checkout(&sale).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(session.books().get(&b.id).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let session = session().await;
        let b = add_book(&session, "Bloodchild", 700, 3).await;

        let mut cart = draft(&[(&b, 1)]);
        cart.set_customer(Some("ghost".to_string()));

        let err = session
            .sales()
            .record_checkout(&NewSale::from_draft(&cart))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Customer"));
        assert_eq!(session.books().get(&b.id).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_deleting_customer_keeps_sale() {
        let session = session().await;
        let b = add_book(&session, "Survivor", 500, 3).await;
        let c = session
            .customers()
            .insert(&NewCustomer {
                name: "Reader".to_string(),
                email: "reader@example.com".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();

        let mut cart = draft(&[(&b, 1)]);
        cart.set_customer(Some(c.id.clone()));
        let record = session
            .sales()
            .record_checkout(&NewSale::from_draft(&cart))
            .await
            .unwrap();

        session.customers().delete(&c.id).await.unwrap();

        let kept = session.sales().get(&record.sale.id).await.unwrap().unwrap();
        assert_eq!(kept.sale.customer_id, None);
        assert_eq!(kept.customer_name, None);
        assert_eq!(kept.lines.len(), 1);

        // the book has history now
        assert!(matches!(
            session.books().delete(&b.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_between_is_half_open() {
        let session = session().await;
        let b = add_book(&session, "Mind of My Mind", 1100, 10).await;

        let record = session
            .sales()
            .record_checkout(&NewSale::from_draft(&draft(&[(&b, 1)])))
            .await
            .unwrap();
        let at = record.sale.created_at;

        let hit = session
            .sales()
            .list_between(at - Duration::minutes(1), at + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].lines.len(), 1);

        let before = session
            .sales()
            .list_between(at - Duration::hours(2), at - Duration::hours(1))
            .await
            .unwrap();
        assert!(before.is_empty());
        assert_eq!(session.sales().list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_checkout_rejected() {
        let session = session().await;
        let err = session
            .sales()
            .record_checkout(&NewSale::from_draft(&DraftSale::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TransactionFailed(_)));
    }
}
