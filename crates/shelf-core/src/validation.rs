//! # Validation Module
//!
//! Input validation for catalog and customer records.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: UI            basic format checks, immediate feedback        │
//! │  Layer 2: Commands      THIS MODULE: business rule validation          │
//! │  Layer 3: SQLite        NOT NULL, UNIQUE (isbn, email), CHECK, FKs     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::validation::{validate_isbn, validate_quantity};
//!
//! assert!(validate_isbn("978-0-441-17271-9").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{BookUpdate, NewBook, NewCustomer};
use crate::{MAX_LINE_QUANTITY, MAX_PRICE_CENTS, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

pub fn validate_title(title: &str) -> ValidationResult<()> {
    required("title", title, 300)
}

pub fn validate_author(author: &str) -> ValidationResult<()> {
    required("author", author, 200)
}

pub fn validate_genre(genre: &str) -> ValidationResult<()> {
    required("genre", genre, 100)
}

pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    required("name", name, 200)
}

/// Validates an ISBN-10 or ISBN-13.
///
/// Hyphens and spaces are ignored. ISBN-10 may end in `X`. The check digit
/// is verified.
///
/// ```rust
/// use shelf_core::validation::validate_isbn;
///
/// assert!(validate_isbn("0-306-40615-2").is_ok());
/// assert!(validate_isbn("9780306406157").is_ok());
/// assert!(validate_isbn("9780306406158").is_err());
/// ```
pub fn validate_isbn(isbn: &str) -> ValidationResult<()> {
    let digits = normalize_isbn(isbn);

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "isbn".to_string(),
        reason: reason.to_string(),
    };

    match digits.len() {
        10 => {
            let mut sum = 0u32;
            for (i, c) in digits.chars().enumerate() {
                let value = match c {
                    '0'..='9' => c.to_digit(10).unwrap_or(0),
                    'X' if i == 9 => 10,
                    _ => return Err(invalid("ISBN-10 must be 9 digits followed by a digit or X")),
                };
                sum += value * (10 - i as u32);
            }
            if sum % 11 != 0 {
                return Err(invalid("check digit does not match"));
            }
        }
        13 => {
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid("ISBN-13 must contain only digits"));
            }
            let sum: u32 = digits
                .chars()
                .filter_map(|c| c.to_digit(10))
                .enumerate()
                .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
                .sum();
            if sum % 10 != 0 {
                return Err(invalid("check digit does not match"));
            }
        }
        _ => return Err(invalid("must be 10 or 13 characters")),
    }

    Ok(())
}

/// Strips hyphens/spaces and upper-cases a trailing `x`.
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Minimal structural email check: one `@`, non-empty local part, a dot in
/// the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    required("email", email, 254)?;

    let invalid = ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(|| invalid.clone())?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid);
    }

    Ok(())
}

/// Trims a free-text search; at most 100 characters. Blank becomes `None`.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(None);
    };

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(Some(query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Quantity of a cart line: `1..=MAX_LINE_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Price in cents. Zero is allowed (giveaways).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Manual stock correction. Zero is a no-op and allowed.
pub fn validate_stock_delta(delta: i64) -> ValidationResult<()> {
    if !(-MAX_STOCK..=MAX_STOCK).contains(&delta) {
        return Err(ValidationError::OutOfRange {
            field: "delta".to_string(),
            min: -MAX_STOCK,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

pub fn validate_new_book(book: &NewBook) -> ValidationResult<()> {
    validate_title(&book.title)?;
    validate_author(&book.author)?;
    validate_genre(&book.genre)?;
    if let Some(isbn) = book.isbn.as_deref().filter(|i| !i.trim().is_empty()) {
        validate_isbn(isbn)?;
    }
    validate_price_cents(book.price_cents)?;
    validate_stock(book.stock)
}

pub fn validate_book_update(book: &BookUpdate) -> ValidationResult<()> {
    validate_title(&book.title)?;
    validate_author(&book.author)?;
    validate_genre(&book.genre)?;
    if let Some(isbn) = book.isbn.as_deref().filter(|i| !i.trim().is_empty()) {
        validate_isbn(isbn)?;
    }
    validate_price_cents(book.price_cents)
}

pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_customer_name(&customer.name)?;
    validate_email(&customer.email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title_and_author() {
        assert!(validate_title("Dune").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"A".repeat(301)).is_err());
        assert!(validate_author("Ursula K. Le Guin").is_ok());
        assert!(validate_author("").is_err());
    }

    #[test]
    fn test_validate_isbn() {
        assert!(validate_isbn("0-306-40615-2").is_ok());
        assert!(validate_isbn("080442957X").is_ok());
        assert!(validate_isbn("080442957x").is_ok());
        assert!(validate_isbn("978-0-306-40615-7").is_ok());

        assert!(validate_isbn("0306406153").is_err());
        assert!(validate_isbn("97803064061").is_err());
        assert!(validate_isbn("97803064061X7").is_err());
        assert!(validate_isbn("").is_err());
    }

    #[test]
    fn test_normalize_isbn() {
        assert_eq!(normalize_isbn("978-0 306-40615-7"), "9780306406157");
        assert_eq!(normalize_isbn("0-8044-2957-x"), "080442957X");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email(" ada@example.co.uk ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("ada@@example.com").is_err());
        assert!(validate_email("ada@.com").is_err());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());

        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());

        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_numeric_ceilings() {
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
        assert!(validate_quantity(i64::MAX).is_err());

        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents(i64::MAX).is_err());

        assert!(validate_stock(MAX_STOCK).is_ok());
        assert!(validate_stock(MAX_STOCK + 1).is_err());

        assert!(validate_stock_delta(-MAX_STOCK).is_ok());
        assert!(validate_stock_delta(MAX_STOCK).is_ok());
        assert!(validate_stock_delta(i64::MAX).is_err());
        assert!(validate_stock_delta(i64::MIN).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query(None).unwrap(), None);
        assert_eq!(validate_search_query(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_search_query(Some(" dune ")).unwrap(),
            Some("dune".to_string())
        );
        assert!(validate_search_query(Some(&"x".repeat(101))).is_err());
    }

    #[test]
    fn test_validate_new_book() {
        let mut book = NewBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            isbn: Some("978-0-441-17271-9".to_string()),
            genre: "Science Fiction".to_string(),
            price_cents: 1099,
            stock: 10,
        };
        assert!(validate_new_book(&book).is_ok());

        book.isbn = Some(String::new());
        assert!(validate_new_book(&book).is_ok());

        book.stock = -1;
        assert!(validate_new_book(&book).is_err());
    }
}
