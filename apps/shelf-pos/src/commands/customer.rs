//! # Customer Commands
//!
//! Customer records plus purchase aggregates derived from the sales ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_core::query::{CustomerFilter, CustomerSort, Page, SortDirection};
use shelf_core::report::{self, CustomerStats};
use shelf_core::validation::{validate_new_customer, validate_search_query};
use shelf_core::{Customer, NewCustomer, SaleRecord};
use tracing::{debug, info};
use ts_rs::TS;

use super::PageRequest;
use crate::error::ApiError;
use crate::state::{CartState, CustomerStore, DbState, SalesLedger};

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerQuery {
    pub filter: CustomerFilter,
    pub sort: CustomerSort,
    pub direction: SortDirection,
    pub page: PageRequest,
}

/// A customer row with purchase aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub customer: Customer,
    pub sale_count: i64,
    pub total_spent_cents: i64,
    #[ts(as = "Option<String>")]
    pub last_purchase_at: Option<DateTime<Utc>>,
}

impl CustomerSummary {
    fn new(customer: Customer, stats: Option<&CustomerStats>) -> Self {
        CustomerSummary {
            customer,
            sale_count: stats.map_or(0, |s| s.sale_count),
            total_spent_cents: stats.map_or(0, |s| s.total_spent_cents),
            last_purchase_at: stats.and_then(|s| s.last_purchase_at),
        }
    }
}

/// Customer detail screen: record, aggregates and purchase history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    pub summary: CustomerSummary,
    /// Newest first.
    pub sales: Vec<SaleRecord>,
}

pub async fn load_customers(
    db: &DbState,
    customers: &CustomerStore,
    user_id: &str,
) -> Result<usize, ApiError> {
    debug!("load_customers command");
    let session = db.session(user_id).await?;

    let loaded = session.customers().list().await?;
    let count = loaded.len();
    customers.replace_all(loaded);

    info!(count = count, "Customers loaded");
    Ok(count)
}

pub async fn list_customers(
    db: &DbState,
    customers: &CustomerStore,
    ledger: &SalesLedger,
    user_id: &str,
    query: CustomerQuery,
) -> Result<Page<CustomerSummary>, ApiError> {
    debug!(query = ?query.filter.query, sort = ?query.sort, "list_customers command");
    db.session(user_id).await?;

    let mut filter = query.filter;
    filter.query = validate_search_query(filter.query.as_deref())?;

    let stats = ledger.customer_stats();
    let page = customers.query(
        &filter,
        query.sort,
        query.direction,
        &stats,
        query.page.page(),
        query.page.page_size(),
    );

    Ok(Page {
        items: page
            .items
            .into_iter()
            .map(|c| {
                let s = stats.get(&c.id);
                CustomerSummary::new(c, s)
            })
            .collect(),
        page: page.page,
        page_size: page.page_size,
        total_items: page.total_items,
        total_pages: page.total_pages,
    })
}

/// Reads the customer and their history from the database.
pub async fn get_customer(
    db: &DbState,
    user_id: &str,
    id: &str,
) -> Result<CustomerDetail, ApiError> {
    debug!(id = %id, "get_customer command");
    let session = db.session(user_id).await?;

    let customer = session.customers().get(id).await?;
    let mut sales = session.sales().list_for_customer(id).await?;
    sales.reverse();

    let stats = report::customer_stats(&sales);
    Ok(CustomerDetail {
        summary: CustomerSummary::new(customer, stats.get(id)),
        sales,
    })
}

/// ## Errors
/// * `VALIDATION_FAILED` - missing name, malformed email
/// * `DUPLICATE_KEY` - email already on file
pub async fn create_customer(
    db: &DbState,
    customers: &CustomerStore,
    user_id: &str,
    customer: NewCustomer,
) -> Result<Customer, ApiError> {
    debug!(name = %customer.name, "create_customer command");
    validate_new_customer(&customer)?;
    let session = db.session(user_id).await?;

    let created = session.customers().insert(&customer).await?;
    customers.upsert(created.clone());

    info!(id = %created.id, "Customer created");
    Ok(created)
}

pub async fn update_customer(
    db: &DbState,
    customers: &CustomerStore,
    ledger: &SalesLedger,
    user_id: &str,
    id: &str,
    update: NewCustomer,
) -> Result<Customer, ApiError> {
    debug!(id = %id, "update_customer command");
    validate_new_customer(&update)?;
    let session = db.session(user_id).await?;

    let updated = session.customers().update(id, &update).await?;
    customers.upsert(updated.clone());
    ledger.rename_customer(id, &updated.name);

    info!(id = %id, "Customer updated");
    Ok(updated)
}

/// Deletes a customer. Their sales stay on record without a customer, and a
/// draft pointing at them is detached.
pub async fn delete_customer(
    db: &DbState,
    customers: &CustomerStore,
    ledger: &SalesLedger,
    cart: &CartState,
    user_id: &str,
    id: &str,
) -> Result<(), ApiError> {
    debug!(id = %id, "delete_customer command");
    let session = db.session(user_id).await?;

    session.customers().delete(id).await?;
    customers.remove(id);
    ledger.forget_customer(id);
    cart.with_cart_mut(|draft| {
        if draft.customer_id() == Some(id) {
            draft.set_customer(None);
        }
    });

    info!(id = %id, "Customer deleted");
    Ok(())
}
