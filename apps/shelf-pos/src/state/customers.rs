//! # Customer Store
//!
//! In-memory customer list. Purchase aggregates are not stored here; they
//! are derived from the [`SalesLedger`](super::SalesLedger) on read.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shelf_core::query::{self, CustomerFilter, CustomerSort, Page, SortDirection};
use shelf_core::report::CustomerStats;
use shelf_core::Customer;

#[derive(Debug, Default)]
pub struct CustomerStore {
    customers: RwLock<Vec<Customer>>,
}

impl CustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&self, customers: Vec<Customer>) {
        *self.write() = customers;
    }

    pub fn upsert(&self, customer: Customer) {
        let mut customers = self.write();
        match customers.iter_mut().find(|c| c.id == customer.id) {
            Some(existing) => *existing = customer,
            None => customers.push(customer),
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut customers = self.write();
        let before = customers.len();
        customers.retain(|c| c.id != id);
        customers.len() != before
    }

    pub fn get(&self, id: &str) -> Option<Customer> {
        self.read().iter().find(|c| c.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Customer> {
        self.read().clone()
    }

    pub fn query(
        &self,
        filter: &CustomerFilter,
        sort: CustomerSort,
        direction: SortDirection,
        stats: &HashMap<String, CustomerStats>,
        page: usize,
        page_size: usize,
    ) -> Page<Customer> {
        let customers = self.read();
        query::query_customers(&customers, filter, sort, direction, stats, page, page_size)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Customer>> {
        self.customers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Customer>> {
        self.customers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(id: &str, name: &str) -> Customer {
        Customer {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", id),
            phone: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_upsert_and_remove() {
        let store = CustomerStore::new();
        store.upsert(customer("c1", "Ada"));
        store.upsert(customer("c1", "Ada Lovelace"));
        store.upsert(customer("c2", "Grace"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("c1").unwrap().name, "Ada Lovelace");
        assert!(store.remove("c1"));
        assert!(store.get("c1").is_none());
    }

    #[test]
    fn test_query_sorts_by_total_spent() {
        let store = CustomerStore::new();
        store.replace_all(vec![customer("c1", "Ada"), customer("c2", "Grace")]);

        let mut stats = HashMap::new();
        stats.insert(
            "c2".to_string(),
            CustomerStats {
                customer_id: "c2".to_string(),
                sale_count: 1,
                total_spent_cents: 5000,
                last_purchase_at: None,
            },
        );

        let page = store.query(
            &CustomerFilter::default(),
            CustomerSort::TotalSpent,
            SortDirection::Desc,
            &stats,
            1,
            20,
        );
        assert_eq!(page.items[0].id, "c2");
    }
}
