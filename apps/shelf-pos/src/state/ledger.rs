//! # Sales Ledger
//!
//! In-memory list of materialized sales. Checkout appends to it; every
//! report and customer aggregate is computed from it on read.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shelf_core::report::{self, CustomerStats, DateRange};
use shelf_core::SaleRecord;

#[derive(Debug, Default)]
pub struct SalesLedger {
    sales: RwLock<Vec<SaleRecord>>,
}

impl SalesLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&self, sales: Vec<SaleRecord>) {
        *self.write() = sales;
    }

    /// Appends a sale unless one with the same id is already recorded.
    pub fn append(&self, record: SaleRecord) {
        let mut sales = self.write();
        if !sales.iter().any(|r| r.sale.id == record.sale.id) {
            sales.push(record);
        }
    }

    pub fn get(&self, id: &str) -> Option<SaleRecord> {
        self.read().iter().find(|r| r.sale.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Runs `f` against the recorded sales without cloning them.
    pub fn with_sales<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[SaleRecord]) -> R,
    {
        let sales = self.read();
        f(&sales)
    }

    /// Sales inside `range`, newest first.
    pub fn in_range(&self, range: &DateRange) -> Vec<SaleRecord> {
        let mut matched: Vec<SaleRecord> = self
            .read()
            .iter()
            .filter(|r| range.contains(r.sale.created_at))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.sale.created_at.cmp(&a.sale.created_at));
        matched
    }

    /// One customer's sales, newest first.
    pub fn for_customer(&self, customer_id: &str) -> Vec<SaleRecord> {
        let mut matched: Vec<SaleRecord> = self
            .read()
            .iter()
            .filter(|r| r.sale.customer_id.as_deref() == Some(customer_id))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.sale.created_at.cmp(&a.sale.created_at));
        matched
    }

    /// Detaches a deleted customer from their sales, mirroring `ON DELETE SET NULL`.
    pub fn forget_customer(&self, customer_id: &str) {
        for record in self.write().iter_mut() {
            if record.sale.customer_id.as_deref() == Some(customer_id) {
                record.sale.customer_id = None;
                record.customer_name = None;
            }
        }
    }

    pub fn rename_customer(&self, customer_id: &str, name: &str) {
        for record in self.write().iter_mut() {
            if record.sale.customer_id.as_deref() == Some(customer_id) {
                record.customer_name = Some(name.to_string());
            }
        }
    }

    pub fn customer_stats(&self) -> HashMap<String, CustomerStats> {
        self.with_sales(report::customer_stats)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<SaleRecord>> {
        self.sales.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<SaleRecord>> {
        self.sales.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use shelf_core::{PaymentMethod, Sale, SaleStatus};

    fn record(id: &str, customer: Option<&str>, total: i64, hours_ago: i64) -> SaleRecord {
        SaleRecord {
            sale: Sale {
                id: id.to_string(),
                customer_id: customer.map(str::to_string),
                subtotal_cents: total,
                tax_cents: 0,
                discount_cents: 0,
                total_cents: total,
                payment_method: PaymentMethod::Cash,
                status: SaleStatus::Completed,
                notes: None,
                created_at: Utc::now() - Duration::hours(hours_ago),
            },
            customer_name: customer.map(|c| format!("Customer {}", c)),
            lines: Vec::new(),
        }
    }

    #[test]
    fn test_append_ignores_duplicates() {
        let ledger = SalesLedger::new();
        ledger.append(record("s1", None, 100, 1));
        ledger.append(record("s1", None, 100, 1));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_in_range_newest_first() {
        let ledger = SalesLedger::new();
        ledger.append(record("old", None, 100, 24 * 40));
        ledger.append(record("s1", None, 100, 3));
        ledger.append(record("s2", None, 100, 1));

        let range = DateRange::last_n_days(7, Utc::now());
        let ids: Vec<String> = ledger.in_range(&range).into_iter().map(|r| r.sale.id).collect();
        assert_eq!(ids, vec!["s2", "s1"]);
    }

    #[test]
    fn test_customer_stats_and_forget() {
        let ledger = SalesLedger::new();
        ledger.append(record("s1", Some("c1"), 1000, 2));
        ledger.append(record("s2", Some("c1"), 500, 1));
        ledger.append(record("s3", None, 700, 1));

        let stats = ledger.customer_stats();
        assert_eq!(stats["c1"].sale_count, 2);
        assert_eq!(stats["c1"].total_spent_cents, 1500);
        assert_eq!(ledger.for_customer("c1").len(), 2);

        ledger.forget_customer("c1");
        assert!(ledger.customer_stats().is_empty());
        assert!(ledger.get("s1").unwrap().customer_name.is_none());
    }
}
