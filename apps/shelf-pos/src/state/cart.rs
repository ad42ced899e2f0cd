//! # Cart State
//!
//! Holds the draft sale being rung up.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  UI Action                Command                 Draft Change          │
//! │  ─────────                ───────                 ────────────          │
//! │                                                                         │
//! │  Pick Book ──────────────► add_to_cart() ───────► merge / push line    │
//! │                                                                         │
//! │  Change Quantity ────────► update_cart_quantity()► qty = n (0 removes) │
//! │                                                                         │
//! │  Click Remove ───────────► remove_from_cart() ──► line dropped         │
//! │                                                                         │
//! │  Pick Customer ──────────► set_cart_customer() ─► customer_id          │
//! │                                                                         │
//! │  Checkout ───────────────► complete_sale() ─────► cleared on success   │
//! │                                                                         │
//! │  NOTE: All access goes through the Mutex. The guard never lives         │
//! │        across an await point.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shelf_core::{DraftSale, TaxRate};

/// Shared draft sale.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<DraftSale>>,
}

impl CartState {
    pub fn new(tax_rate: TaxRate) -> Self {
        CartState {
            cart: Arc::new(Mutex::new(DraftSale::new(tax_rate))),
        }
    }

    /// Executes a function with read access to the draft.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|draft| draft.totals());
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&DraftSale) -> R,
    {
        let cart = self.lock();
        f(&cart)
    }

    /// Executes a function with write access to the draft.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|draft| draft.add_item(&book, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut DraftSale) -> R,
    {
        let mut cart = self.lock();
        f(&mut cart)
    }

    // DraftSale validates before mutating and its money math saturates, so
    // a poisoned lock (from a panic inside a caller's closure) still guards
    // a consistent draft.
    fn lock(&self) -> MutexGuard<'_, DraftSale> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new(TaxRate::default())
    }
}
