//! # Sale Commands
//!
//! Checkout completion and sales history.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    complete_sale                                        │
//! │                                                                         │
//! │  1. admin session                                                       │
//! │  2. snapshot draft ─► empty? ──────────────────────► VALIDATION_FAILED  │
//! │  3. totals.change_for(paid) ─► short? ─────────────► VALIDATION_FAILED  │
//! │  4. record_checkout (ONE transaction)                                   │
//! │        header ─► per line: conditional decrement + item ─► commit       │
//! │        any failure ──► rollback ───────────────────► error, draft kept  │
//! │  5. ledger.append(sale)                                                 │
//! │  6. catalog.upsert(each sold book), customers.upsert(walk-in)           │
//! │  7. clear draft                                                         │
//! │  8. Receipt { sale, amount paid, change }                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 5 to 7 run only after commit. A failed store refresh is logged and
//! does not undo the sale.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shelf_core::validation::validate_new_customer;
use shelf_core::{CoreError, DraftSale, Money, NewCustomer, SaleRecord};
use shelf_db::{AdminSession, NewSale};
use tracing::{debug, info, warn};
use ts_rs::TS;

use super::report::RangeRequest;
use crate::error::ApiError;
use crate::state::{CartState, CatalogStore, ConfigState, CustomerStore, DbState, SalesLedger};

/// Tender details for completing the current draft.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSaleRequest {
    pub amount_paid_cents: i64,
    /// Walk-in customer to create with the sale. Replaces any customer
    /// already on the draft.
    #[serde(default)]
    pub new_customer: Option<NewCustomer>,
}

/// Materialized sale as handed back to the till.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub store_name: String,
    pub sale: SaleRecord,
    pub amount_paid_cents: i64,
    pub change_cents: i64,
}

impl Receipt {
    /// Plain-text rendering for a receipt printer or the CLI.
    pub fn render(&self, config: &ConfigState) -> String {
        let sale = &self.sale.sale;
        let mut out = String::new();

        out.push_str(&format!("{}\n", self.store_name));
        out.push_str(&format!("Sale {}\n", sale.id));
        out.push_str(&format!("{}\n", sale.created_at.format("%Y-%m-%d %H:%M UTC")));
        if let Some(name) = &self.sale.customer_name {
            out.push_str(&format!("Customer: {}\n", name));
        }
        out.push('\n');

        for line in &self.sale.lines {
            out.push_str(&format!(
                "{} x{} @ {} = {}\n",
                line.title,
                line.quantity,
                config.format_currency(line.unit_price_cents),
                config.format_currency(line.line_total_cents)
            ));
        }

        out.push('\n');
        out.push_str(&format!("Subtotal  {}\n", config.format_currency(sale.subtotal_cents)));
        if sale.discount_cents > 0 {
            out.push_str(&format!("Discount -{}\n", config.format_currency(sale.discount_cents)));
        }
        out.push_str(&format!("Tax       {}\n", config.format_currency(sale.tax_cents)));
        out.push_str(&format!("Total     {}\n", config.format_currency(sale.total_cents)));
        out.push_str(&format!(
            "Paid      {} ({})\n",
            config.format_currency(self.amount_paid_cents),
            sale.payment_method.as_str()
        ));
        out.push_str(&format!("Change    {}\n", config.format_currency(self.change_cents)));
        out
    }
}

/// Completes the current draft.
///
/// ## Errors
/// * `VALIDATION_FAILED` - empty draft, insufficient payment, bad walk-in customer
/// * `OUT_OF_STOCK` - a line exceeds the stock the database holds right now
/// * `NOT_FOUND` - a book or the draft's customer no longer exists
/// * `DUPLICATE_KEY` - walk-in customer email already on file
///
/// On any error nothing is persisted and the draft is left as it was.
#[allow(clippy::too_many_arguments)]
pub async fn complete_sale(
    db: &DbState,
    cart: &CartState,
    catalog: &CatalogStore,
    customers: &CustomerStore,
    ledger: &SalesLedger,
    config: &ConfigState,
    user_id: &str,
    request: CompleteSaleRequest,
) -> Result<Receipt, ApiError> {
    debug!(amount_paid_cents = request.amount_paid_cents, "complete_sale command");
    let session = db.session(user_id).await?;

    let draft = cart.with_cart(|d| d.clone());
    if draft.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    let totals = draft.totals();
    let change = totals.change_for(Money::from_cents(request.amount_paid_cents))?;

    let mut new_sale = NewSale::from_draft(&draft);
    if let Some(walk_in) = request.new_customer {
        validate_new_customer(&walk_in)?;
        new_sale = new_sale.with_new_customer(walk_in);
    }

    let record = session.sales().record_checkout(&new_sale).await?;

    ledger.append(record.clone());
    refresh_sold_books(&session, catalog, &record).await;
    refresh_customer(&session, customers, &record).await;
    if !cart.with_cart_mut(|d| settle_draft(d, &draft)) {
        warn!("Draft changed during checkout; kept lines added since");
    }

    info!(
        sale_id = %record.sale.id,
        total_cents = record.sale.total_cents,
        change_cents = change.cents(),
        "Sale completed"
    );

    Ok(Receipt {
        store_name: config.store_name.clone(),
        sale: record,
        amount_paid_cents: request.amount_paid_cents,
        change_cents: change.cents(),
    })
}

/// Resets the live draft after `sold` was committed.
///
/// When the draft still equals the checked-out snapshot it is cleared and
/// `true` comes back. Otherwise only the sold books are dropped, so lines
/// added while the sale was in flight survive.
fn settle_draft(current: &mut DraftSale, sold: &DraftSale) -> bool {
    if current == sold {
        current.clear();
        return true;
    }

    for line in sold.lines() {
        current.remove_item(&line.book_id);
    }
    false
}

async fn refresh_sold_books(session: &AdminSession, catalog: &CatalogStore, record: &SaleRecord) {
    let ids: BTreeSet<&str> = record.lines.iter().map(|l| l.book_id.as_str()).collect();
    let books = session.books();

    for id in ids {
        match books.get_by_id(id).await {
            Ok(Some(book)) => catalog.upsert(book),
            Ok(None) => {
                catalog.remove(id);
            }
            Err(e) => warn!(book_id = %id, error = %e, "Could not refresh sold book"),
        }
    }
}

async fn refresh_customer(session: &AdminSession, customers: &CustomerStore, record: &SaleRecord) {
    let Some(id) = record.sale.customer_id.as_deref() else {
        return;
    };
    if customers.get(id).is_some() {
        return;
    }

    match session.customers().get_by_id(id).await {
        Ok(Some(customer)) => customers.upsert(customer),
        Ok(None) => {}
        Err(e) => warn!(customer_id = %id, error = %e, "Could not refresh sale customer"),
    }
}

/// Reloads the sales ledger with the full history.
pub async fn load_sales(db: &DbState, ledger: &SalesLedger, user_id: &str) -> Result<usize, ApiError> {
    debug!("load_sales command");
    let session = db.session(user_id).await?;

    let sales = session.sales().list_all().await?;
    let count = sales.len();
    ledger.replace_all(sales);

    info!(count = count, "Sales ledger loaded");
    Ok(count)
}

pub async fn get_sale(db: &DbState, user_id: &str, id: &str) -> Result<SaleRecord, ApiError> {
    debug!(id = %id, "get_sale command");
    let session = db.session(user_id).await?;

    session
        .sales()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", id))
}

/// Sales inside a date window, read from the database, oldest first.
pub async fn list_sales(
    db: &DbState,
    user_id: &str,
    range: RangeRequest,
) -> Result<Vec<SaleRecord>, ApiError> {
    debug!(range = ?range, "list_sales command");
    let range = range.resolve(chrono::Utc::now())?;
    let session = db.session(user_id).await?;

    Ok(session.sales().list_between(range.start, range.end).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::book::{adjust_stock, get_book};
    use crate::commands::cart::{add_to_cart, get_cart, set_cart_discount, set_cart_payment_method};
    use crate::commands::test_support::{TestApp, ADMIN};
    use crate::error::ErrorCode;
    use shelf_core::PaymentMethod;

    async fn checkout(app: &TestApp, paid: i64) -> Result<Receipt, ApiError> {
        checkout_as(app, ADMIN, paid, None).await
    }

    async fn checkout_as(
        app: &TestApp,
        user: &str,
        paid: i64,
        new_customer: Option<NewCustomer>,
    ) -> Result<Receipt, ApiError> {
        complete_sale(
            &app.db,
            &app.cart,
            &app.catalog,
            &app.customers,
            &app.ledger,
            &app.config,
            user,
            CompleteSaleRequest {
                amount_paid_cents: paid,
                new_customer,
            },
        )
        .await
    }

    #[tokio::test]
    async fn test_complete_sale_records_and_clears() {
        let app = TestApp::new().await;
        let book = app.add_book("Dune", 1000, 10).await;

        add_to_cart(&app.catalog, &app.cart, &book.id, 3).unwrap();
        set_cart_discount(&app.cart, 10.0);
        set_cart_payment_method(&app.cart, PaymentMethod::Card);
        let draft_totals = get_cart(&app.cart).totals;

        let receipt = checkout(&app, 3000).await.unwrap();

        assert_eq!(receipt.sale.sale.subtotal_cents, draft_totals.subtotal_cents);
        assert_eq!(receipt.sale.sale.discount_cents, 300);
        assert_eq!(receipt.sale.sale.tax_cents, 240);
        assert_eq!(receipt.sale.sale.total_cents, 2940);
        assert_eq!(receipt.change_cents, 60);
        assert_eq!(receipt.sale.lines[0].title, "Dune");

        // Stock decremented in the database and in the store
        assert_eq!(get_book(&app.db, ADMIN, &book.id).await.unwrap().stock, 7);
        assert_eq!(app.catalog.get(&book.id).unwrap().stock, 7);

        // Ledger holds the sale, draft is reset
        assert_eq!(app.ledger.len(), 1);
        let cart = get_cart(&app.cart);
        assert!(cart.lines.is_empty());
        assert_eq!(cart.discount_percent, 0.0);
        assert_eq!(cart.payment_method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn test_settle_keeps_lines_added_during_checkout() {
        let app = TestApp::new().await;
        let dune = app.add_book("Dune", 1000, 5).await;
        let emma = app.add_book("Emma", 800, 5).await;
        let dune = app.catalog.get(&dune.id).unwrap();
        let emma = app.catalog.get(&emma.id).unwrap();

        let mut live = DraftSale::default();
        live.add_item(&dune, 2).unwrap();
        let sold = live.clone();

        // Unchanged draft clears completely
        let mut untouched = sold.clone();
        assert!(settle_draft(&mut untouched, &sold));
        assert!(untouched.is_empty());

        // A line added after the snapshot survives; the sold line goes
        live.add_item(&emma, 1).unwrap();
        assert!(!settle_draft(&mut live, &sold));
        assert_eq!(live.quantity_of(&dune.id), 0);
        assert_eq!(live.quantity_of(&emma.id), 1);
    }

    #[tokio::test]
    async fn test_insufficient_payment_keeps_draft() {
        let app = TestApp::new().await;
        let book = app.add_book("Dune", 1000, 10).await;
        add_to_cart(&app.catalog, &app.cart, &book.id, 1).unwrap();

        let err = checkout(&app, 500).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("insufficient payment"));
        assert_eq!(get_cart(&app.cart).lines.len(), 1);
        assert!(app.ledger.is_empty());
        assert_eq!(get_book(&app.db, ADMIN, &book.id).await.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let app = TestApp::new().await;
        let err = checkout(&app, 1000).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn test_stale_stock_rolls_back_whole_sale() {
        let app = TestApp::new().await;
        let plenty = app.add_book("Dune", 1000, 10).await;
        let scarce = app.add_book("Emma", 800, 2).await;

        add_to_cart(&app.catalog, &app.cart, &plenty.id, 2).unwrap();
        add_to_cart(&app.catalog, &app.cart, &scarce.id, 2).unwrap();

        // Someone else corrects stock down after the books were added
        adjust_stock(&app.db, &app.catalog, ADMIN, &scarce.id, -1)
            .await
            .unwrap();

        let err = checkout(&app, 10_000).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OutOfStock);

        assert_eq!(get_book(&app.db, ADMIN, &plenty.id).await.unwrap().stock, 10);
        assert_eq!(get_book(&app.db, ADMIN, &scarce.id).await.unwrap().stock, 1);
        assert_eq!(get_cart(&app.cart).lines.len(), 2);
        assert!(app.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_sequential_sales_decrement_cumulatively() {
        let app = TestApp::new().await;
        let book = app.add_book("Dune", 1000, 10).await;

        add_to_cart(&app.catalog, &app.cart, &book.id, 4).unwrap();
        checkout(&app, 10_000).await.unwrap();
        add_to_cart(&app.catalog, &app.cart, &book.id, 5).unwrap();
        checkout(&app, 10_000).await.unwrap();

        assert_eq!(get_book(&app.db, ADMIN, &book.id).await.unwrap().stock, 1);
        assert_eq!(app.ledger.len(), 2);

        let count = load_sales(&app.db, &app.ledger, ADMIN).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_walk_in_customer_created_with_sale() {
        let app = TestApp::new().await;
        let book = app.add_book("Dune", 1000, 10).await;
        add_to_cart(&app.catalog, &app.cart, &book.id, 1).unwrap();

        let walk_in = NewCustomer {
            name: "Octavia Butler".to_string(),
            email: "octavia@example.com".to_string(),
            phone: None,
            address: None,
        };
        let receipt = checkout_as(&app, ADMIN, 1080, Some(walk_in)).await.unwrap();

        let customer_id = receipt.sale.sale.customer_id.clone().unwrap();
        assert_eq!(receipt.sale.customer_name.as_deref(), Some("Octavia Butler"));
        assert_eq!(app.customers.get(&customer_id).unwrap().name, "Octavia Butler");
        assert_eq!(receipt.change_cents, 0);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_complete_sale() {
        let app = TestApp::new().await;
        let book = app.add_book("Dune", 1000, 10).await;
        add_to_cart(&app.catalog, &app.cart, &book.id, 1).unwrap();

        let err = checkout_as(&app, "clerk", 5000, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(get_cart(&app.cart).lines.len(), 1);
    }

    #[tokio::test]
    async fn test_history_queries() {
        let app = TestApp::new().await;
        let book = app.add_book("Dune", 1000, 10).await;
        add_to_cart(&app.catalog, &app.cart, &book.id, 1).unwrap();
        let receipt = checkout(&app, 2000).await.unwrap();

        let sale = get_sale(&app.db, ADMIN, &receipt.sale.sale.id).await.unwrap();
        assert_eq!(sale, receipt.sale);

        let today = list_sales(&app.db, ADMIN, RangeRequest::Today).await.unwrap();
        assert_eq!(today.len(), 1);

        let err = get_sale(&app.db, ADMIN, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_receipt_render() {
        let app = TestApp::new().await;
        let book = app.add_book("Dune", 1000, 10).await;
        add_to_cart(&app.catalog, &app.cart, &book.id, 3).unwrap();
        set_cart_discount(&app.cart, 10.0);

        let text = checkout(&app, 3000).await.unwrap().render(&app.config);

        assert!(text.contains("Dune x3 @ $10.00 = $30.00"));
        assert!(text.contains("Discount -$3.00"));
        assert!(text.contains("Total     $29.40"));
        assert!(text.contains("Change    $0.60"));
    }
}
