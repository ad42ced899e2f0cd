//! # Cart Commands
//!
//! Draft sale manipulation. Nothing here touches the database: books are
//! resolved against the catalog store and stock is checked against the
//! stock that store last saw.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│  Tender  │────►│ Recorded │       │
//! │  │  Draft   │     │          │     │          │     │   Sale   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                              │
//! │                   add_to_cart       complete_sale                      │
//! │                   update_cart_qty   (sale.rs)                          │
//! │                   remove_from_cart                                      │
//! │                   set_cart_*                                            │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use shelf_core::{CartLine, CartTotals, CoreError, DraftSale, PaymentMethod};
use tracing::debug;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::{CartState, CatalogStore, CustomerStore};

/// Cart response: lines, derived totals and the draft's settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub discount_percent: f64,
    pub tax_rate_bps: u32,
    pub notes: Option<String>,
}

impl From<&DraftSale> for CartView {
    fn from(draft: &DraftSale) -> Self {
        CartView {
            lines: draft.lines().to_vec(),
            totals: draft.totals(),
            customer_id: draft.customer_id().map(str::to_string),
            payment_method: draft.payment_method(),
            discount_percent: draft.discount().percentage(),
            tax_rate_bps: draft.tax_rate().bps(),
            notes: draft.notes().map(str::to_string),
        }
    }
}

pub fn get_cart(cart: &CartState) -> CartView {
    debug!("get_cart command");
    cart.with_cart(|draft| CartView::from(draft))
}

/// Adds `quantity` copies of a catalog book.
///
/// ## Errors
/// * `NOT_FOUND` - book id unknown to the catalog store
/// * `OUT_OF_STOCK` - cart quantity would exceed the book's stock
/// * `VALIDATION_FAILED` - quantity not positive, or cart full
///
/// The draft is unchanged on any error.
pub fn add_to_cart(
    catalog: &CatalogStore,
    cart: &CartState,
    book_id: &str,
    quantity: i64,
) -> Result<CartView, ApiError> {
    debug!(book_id = %book_id, quantity = quantity, "add_to_cart command");

    let book = catalog
        .get(book_id)
        .ok_or_else(|| CoreError::BookNotFound(book_id.to_string()))?;

    cart.with_cart_mut(|draft| -> Result<CartView, ApiError> {
        draft.add_item(&book, quantity)?;
        Ok(CartView::from(&*draft))
    })
}

/// Sets a line's quantity; zero or less removes the line.
pub fn update_cart_quantity(
    cart: &CartState,
    book_id: &str,
    quantity: i64,
) -> Result<CartView, ApiError> {
    debug!(book_id = %book_id, quantity = quantity, "update_cart_quantity command");

    cart.with_cart_mut(|draft| -> Result<CartView, ApiError> {
        draft.set_quantity(book_id, quantity)?;
        Ok(CartView::from(&*draft))
    })
}

pub fn remove_from_cart(cart: &CartState, book_id: &str) -> Result<CartView, ApiError> {
    debug!(book_id = %book_id, "remove_from_cart command");

    cart.with_cart_mut(|draft| -> Result<CartView, ApiError> {
        if !draft.remove_item(book_id) {
            return Err(CoreError::NotInCart(book_id.to_string()).into());
        }
        Ok(CartView::from(&*draft))
    })
}

/// Attaches a known customer, or detaches with `None`.
pub fn set_cart_customer(
    customers: &CustomerStore,
    cart: &CartState,
    customer_id: Option<String>,
) -> Result<CartView, ApiError> {
    debug!(customer_id = ?customer_id, "set_cart_customer command");

    if let Some(id) = customer_id.as_deref() {
        if customers.get(id).is_none() {
            return Err(CoreError::CustomerNotFound(id.to_string()).into());
        }
    }

    Ok(cart.with_cart_mut(|draft| {
        draft.set_customer(customer_id);
        CartView::from(&*draft)
    }))
}

pub fn set_cart_payment_method(cart: &CartState, method: PaymentMethod) -> CartView {
    debug!(method = %method.as_str(), "set_cart_payment_method command");
    cart.with_cart_mut(|draft| {
        draft.set_payment_method(method);
        CartView::from(&*draft)
    })
}

/// Discount percentage, clamped into 0-100.
pub fn set_cart_discount(cart: &CartState, percent: f64) -> CartView {
    debug!(percent = percent, "set_cart_discount command");
    cart.with_cart_mut(|draft| {
        draft.set_discount(percent);
        CartView::from(&*draft)
    })
}

pub fn set_cart_notes(cart: &CartState, notes: Option<String>) -> CartView {
    debug!("set_cart_notes command");
    cart.with_cart_mut(|draft| {
        draft.set_notes(notes);
        CartView::from(&*draft)
    })
}

pub fn clear_cart(cart: &CartState) -> CartView {
    debug!("clear_cart command");
    cart.with_cart_mut(|draft| {
        draft.clear();
        CartView::from(&*draft)
    })
}
