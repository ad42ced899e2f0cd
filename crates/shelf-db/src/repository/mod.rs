//! # Repository Module
//!
//! One repository per table group, each wrapping a cloned pool handle.
//! Obtained from an [`AdminSession`](crate::AdminSession), never directly.
//!
//! ```text
//! AdminSession
//! ├── books()      BookRepository      insert / get / list / update / adjust_stock / delete
//! ├── customers()  CustomerRepository  insert / get / list / update / delete
//! └── sales()      SaleRepository      record_checkout / get / list_between / list_for_customer
//! ```

pub mod book;
pub mod customer;
pub mod sale;

/// Trims an optional text column; blank becomes NULL.
pub(crate) fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
