//! # Domain Types
//!
//! Core domain types used throughout Shelf POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  isbn (unique)  │◄──┼─ customer_id?   │◄──┤  book_id (FK)   │       │
//! │  │  price_cents    │   │  total_cents    │   │  unit_price     │       │
//! │  │  stock          │   │  payment_method │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │  PaymentMethod  │   │ TaxRate /       │       │
//! │  │  email (unique) │   │  Cash           │   │ DiscountRate    │       │
//! │  │                 │   │  Card / Mobile  │   │ (basis points)  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sale owns its SaleItems (cascade delete). Books and customers are only
//! referenced: a book with sale history cannot be deleted, a deleted
//! customer leaves their sales with `customer_id = NULL`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Rates
// =============================================================================

/// Tax rate in basis points (800 bps = 8%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (8.0 → 800 bps).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct.max(0.0) * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as a percentage, for display.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

/// Whole-sale discount in basis points, always within 0..=10000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    pub const MAX_BPS: u32 = 10_000;

    /// Clamps a percentage into [0, 100]. NaN is treated as no discount.
    ///
    /// ```rust
    /// use shelf_core::types::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::from_percentage(10.0).bps(), 1000);
    /// assert_eq!(DiscountRate::from_percentage(150.0).bps(), 10000);
    /// assert_eq!(DiscountRate::from_percentage(-5.0).bps(), 0);
    /// ```
    pub fn from_percentage(pct: f64) -> Self {
        if pct.is_nan() {
            return DiscountRate(0);
        }
        let bps = (pct.clamp(0.0, 100.0) * 100.0).round() as u32;
        DiscountRate(bps.min(Self::MAX_BPS))
    }

    pub const fn from_bps(bps: u32) -> Self {
        if bps > Self::MAX_BPS {
            DiscountRate(Self::MAX_BPS)
        } else {
            DiscountRate(bps)
        }
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Book
// =============================================================================

/// A title carried by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Book {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub title: String,
    pub author: String,
    /// ISBN-10 or ISBN-13, unique when present.
    pub isbn: Option<String>,
    pub genre: String,
    /// Retail price in cents.
    pub price_cents: i64,
    /// Units on the shelf. Never negative.
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Retail value of the units on hand.
    pub fn stock_value(&self) -> Money {
        self.price().multiply_quantity(self.stock)
    }

    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }

    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock <= threshold
    }
}

/// Fields required to add a book to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre: String,
    pub price_cents: i64,
    pub stock: i64,
}

/// Editable book details. Stock is changed only through adjustments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre: String,
    pub price_cents: i64,
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Unique across customers.
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Sale Status / Payment Method
// =============================================================================

/// The status of a persisted sale.
///
/// Sales are only written at checkout completion, so every stored sale is
/// `Completed`. The column exists so history stays readable if voids are
/// ever introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SaleStatus {
    #[default]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash. The default for a fresh draft.
    #[default]
    Cash,
    /// Card on an external terminal.
    Card,
    /// Phone wallet / QR payment.
    Mobile,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Mobile];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mobile => "mobile",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "mobile" | "wallet" => Ok(PaymentMethod::Mobile),
            other => Err(crate::error::ValidationError::InvalidFormat {
                field: "payment method".to_string(),
                reason: format!("unknown method '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale header.
///
/// Invariant: `total_cents == subtotal_cents - discount_cents + tax_cents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// Discount amount in cents (not the percentage).
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Checks the stored totals against each other.
    pub fn totals_consistent(&self) -> bool {
        self.subtotal_cents >= 0
            && self.tax_cents >= 0
            && self.discount_cents >= 0
            && self.total_cents >= 0
            && self.total_cents == self.subtotal_cents - self.discount_cents + self.tax_cents
    }
}

/// A persisted line item. Price is the snapshot taken when the book was
/// added to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub book_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `unit_price_cents × quantity`.
    pub line_total_cents: i64,
}

/// A line item joined with the book's title and author, for receipts and
/// reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// A sale with its items resolved: what checkout returns and what the sales
/// ledger holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleRecord {
    pub sale: Sale,
    pub customer_name: Option<String>,
    pub lines: Vec<SaleLine>,
}

impl SaleRecord {
    pub fn units(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(subtotal: i64, discount: i64, tax: i64, total: i64) -> Sale {
        Sale {
            id: "s-1".to_string(),
            customer_id: None,
            subtotal_cents: subtotal,
            tax_cents: tax,
            discount_cents: discount,
            total_cents: total,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(8.0).bps(), 800);
        assert_eq!(TaxRate::default().bps(), 800);
        assert!((TaxRate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_discount_rate_clamps() {
        assert_eq!(DiscountRate::from_percentage(12.5).bps(), 1250);
        assert_eq!(DiscountRate::from_percentage(f64::NAN).bps(), 0);
        assert_eq!(DiscountRate::from_bps(20_000).bps(), 10_000);
        assert!(DiscountRate::default().is_zero());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("Cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("debit".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!(" mobile ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Mobile);
        assert!("cheque".parse::<PaymentMethod>().is_err());
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_payment_method_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::Card).unwrap();
        assert_eq!(json, "\"card\"");
    }

    #[test]
    fn test_sale_totals_consistency() {
        assert!(sale(3000, 300, 240, 2940).totals_consistent());
        assert!(!sale(3000, 300, 240, 2700).totals_consistent());
        assert!(!sale(3000, -1, 240, 3241).totals_consistent());
    }

    #[test]
    fn test_book_stock_helpers() {
        let now = Utc::now();
        let book = Book {
            id: "b-1".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: None,
            genre: "Science Fiction".to_string(),
            price_cents: 1250,
            stock: 4,
            created_at: now,
            updated_at: now,
        };
        assert!(book.can_sell(4));
        assert!(!book.can_sell(5));
        assert!(!book.can_sell(0));
        assert!(book.is_low_stock(5));
        assert_eq!(book.stock_value().cents(), 5000);
    }
}
