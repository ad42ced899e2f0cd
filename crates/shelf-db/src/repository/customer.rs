//! # Customer Repository
//!
//! Deleting a customer never touches their sales: `sales.customer_id` is
//! `ON DELETE SET NULL`, so history stays and becomes anonymous.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use super::blank_to_none;
use crate::error::{DbError, DbResult};
use shelf_core::{Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, created_at";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a validated customer.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - email already on file (case-insensitive)
    pub async fn insert(&self, customer: &NewCustomer) -> DbResult<Customer> {
        let mut tx = self.pool.begin().await?;
        let created = insert_in(&mut tx, customer).await?;
        tx.commit().await?;
        Ok(created)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn get(&self, id: &str) -> DbResult<Customer> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = ?1"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// All customers, by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name COLLATE NOCASE, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = customers.len(), "Listed customers");
        Ok(customers)
    }

    pub async fn update(&self, id: &str, update: &NewCustomer) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let email = update.email.trim();
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET
                name = ?2,
                email = ?3,
                phone = ?4,
                address = ?5
            WHERE id = ?1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name.trim())
        .bind(email)
        .bind(blank_to_none(update.phone.as_deref()))
        .bind(blank_to_none(update.address.as_deref()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(Some(email)))?
        .ok_or_else(|| DbError::not_found("Customer", id))?;

        Ok(customer)
    }

    /// Deletes a customer. Their sales keep `customer_id = NULL`.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id = %id, "Customer deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts inside an open transaction. Shared with checkout, which creates
/// walk-in customers atomically with the sale.
pub(crate) async fn insert_in(
    tx: &mut Transaction<'_, Sqlite>,
    customer: &NewCustomer,
) -> DbResult<Customer> {
    let created = Customer {
        id: Uuid::new_v4().to_string(),
        name: customer.name.trim().to_string(),
        email: customer.email.trim().to_string(),
        phone: blank_to_none(customer.phone.as_deref()),
        address: blank_to_none(customer.address.as_deref()),
        created_at: Utc::now(),
    };

    debug!(id = %created.id, "Inserting customer");

    sqlx::query(
        r#"
        INSERT INTO customers (id, name, email, phone, address, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&created.id)
    .bind(&created.name)
    .bind(&created.email)
    .bind(&created.phone)
    .bind(&created.address)
    .bind(created.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| DbError::from(e).with_duplicate_value(Some(&created.email)))?;

    info!(id = %created.id, "Customer added");
    Ok(created)
}

/// Checks that `id` exists, inside an open transaction.
pub(crate) async fn exists_in(tx: &mut Transaction<'_, Sqlite>, id: &str) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = ?1)")
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;

    Ok(exists)
}
