//! # Draft Sale
//!
//! The in-progress sale at the register, before anything is persisted.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Sale Operations                                │
//! │                                                                         │
//! │  add_item(book, qty) ───► stock check ──► merge into line / new line    │
//! │                           (cumulative)    price frozen at first add     │
//! │                                                                         │
//! │  set_quantity(id, n) ───► n <= 0 ? remove_item(id) : line.qty = n      │
//! │                                                                         │
//! │  remove_item(id) ───────► drop the whole line                           │
//! │                                                                         │
//! │  subtotal / discount / tax / total ──► derived on every read            │
//! │                                                                         │
//! │  clear() ───────────────► empty, cash, 0% discount                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! ```text
//! subtotal = Σ unit_price × quantity
//! discount = subtotal × discount% (half-up to the cent)
//! tax      = subtotal × tax%      (half-up, on the undiscounted subtotal)
//! total    = subtotal - discount + tax
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Book, DiscountRate, PaymentMethod, TaxRate};
use crate::validation::validate_quantity;
use crate::MAX_CART_LINES;

/// One book in the draft sale.
///
/// Title, author and price are copied from the catalog when the line is
/// first created and never re-read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub unit_price_cents: i64,
    /// Always > 0.
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_book(book: &Book, quantity: i64) -> Self {
        CartLine {
            book_id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            unit_price_cents: book.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// `unit_price × quantity`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

/// The draft sale (cart).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSale {
    lines: Vec<CartLine>,
    customer_id: Option<String>,
    payment_method: PaymentMethod,
    discount: DiscountRate,
    notes: Option<String>,
    tax_rate: TaxRate,
    created_at: DateTime<Utc>,
}

impl Default for DraftSale {
    fn default() -> Self {
        DraftSale::new(TaxRate::default())
    }
}

impl DraftSale {
    /// Creates an empty draft taxed at `tax_rate`.
    pub fn new(tax_rate: TaxRate) -> Self {
        DraftSale {
            lines: Vec::new(),
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            discount: DiscountRate::default(),
            notes: None,
            tax_rate,
            created_at: Utc::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Lines
    // -------------------------------------------------------------------------

    /// Adds `quantity` units of `book`, merging into an existing line.
    ///
    /// Fails with `OutOfStock` when the line's cumulative quantity would
    /// exceed `book.stock`, and with a validation error past
    /// `MAX_LINE_QUANTITY`. The draft is untouched on any error.
    pub fn add_item(&mut self, book: &Book, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        let in_cart = self.quantity_of(&book.id);
        let requested = in_cart.saturating_add(quantity);
        validate_quantity(requested)?;
        if !book.can_sell(requested) {
            return Err(CoreError::OutOfStock {
                book_id: book.id.clone(),
                title: book.title.clone(),
                available: book.stock,
                requested,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.book_id == book.id) {
            line.quantity = requested;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_book(book, quantity));
        Ok(())
    }

    /// Drops the line for `book_id` whatever its quantity. Returns whether a
    /// line was removed.
    pub fn remove_item(&mut self, book_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.book_id != book_id);
        self.lines.len() != before
    }

    /// Sets a line's quantity; `quantity <= 0` removes the line.
    ///
    /// Stock is not re-checked here. Checkout validates against the
    /// persisted stock level. Quantities past `MAX_LINE_QUANTITY` are
    /// rejected and leave the line as it was.
    pub fn set_quantity(&mut self, book_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove_item(book_id);
            return Ok(());
        }
        validate_quantity(quantity)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.book_id == book_id)
            .ok_or_else(|| CoreError::NotInCart(book_id.to_string()))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Units of `book_id` currently in the draft (0 if absent).
    pub fn quantity_of(&self, book_id: &str) -> i64 {
        self.lines
            .iter()
            .find(|l| l.book_id == book_id)
            .map_or(0, |l| l.quantity)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // -------------------------------------------------------------------------
    // Header fields
    // -------------------------------------------------------------------------

    pub fn set_customer(&mut self, customer_id: Option<String>) {
        self.customer_id = customer_id.filter(|id| !id.trim().is_empty());
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Sets the whole-sale discount, clamped into 0..=100 percent.
    pub fn set_discount(&mut self, percent: f64) {
        self.discount = DiscountRate::from_percentage(percent);
    }

    pub fn discount(&self) -> DiscountRate {
        self.discount
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // -------------------------------------------------------------------------
    // Derived totals
    // -------------------------------------------------------------------------

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    pub fn discount_amount(&self) -> Money {
        self.subtotal().percentage(self.discount.bps())
    }

    /// Tax on the undiscounted subtotal.
    pub fn tax(&self) -> Money {
        self.subtotal().calculate_tax(self.tax_rate)
    }

    pub fn total(&self) -> Money {
        self.subtotal() - self.discount_amount() + self.tax()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    /// Resets to an empty draft: no customer, cash, no discount, no notes.
    /// The tax rate is store configuration and survives.
    pub fn clear(&mut self) {
        *self = DraftSale::new(self.tax_rate);
    }
}

/// Totals summary of a draft sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub discount_bps: u32,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl CartTotals {
    /// Change owed for `paid`, or `InsufficientPayment` when it falls short.
    pub fn change_for(&self, paid: Money) -> CoreResult<Money> {
        if paid.cents() < self.total_cents {
            return Err(CoreError::InsufficientPayment {
                total_cents: self.total_cents,
                paid_cents: paid.cents(),
            });
        }
        Ok(paid - Money::from_cents(self.total_cents))
    }
}

impl From<&DraftSale> for CartTotals {
    fn from(draft: &DraftSale) -> Self {
        let subtotal = draft.subtotal();
        let discount = subtotal.percentage(draft.discount.bps());
        let tax = subtotal.calculate_tax(draft.tax_rate);
        CartTotals {
            line_count: draft.line_count(),
            total_quantity: draft.total_quantity(),
            subtotal_cents: subtotal.cents(),
            discount_bps: draft.discount.bps(),
            discount_cents: discount.cents(),
            tax_cents: tax.cents(),
            total_cents: (subtotal - discount + tax).cents(),
        }
    }
}
