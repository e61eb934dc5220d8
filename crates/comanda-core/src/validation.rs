//! # Validation Module
//!
//! Input validation shared by every service.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum)                                       │
//! │  ├── JSON shape, UUID path parameters                                  │
//! │  └── 400 on malformed input                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services                                                     │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (email, table number, qr code, sales date)                 │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("name", "X-Salada").unwrap();
//! validate_quantity(2).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use uuid::Uuid;

use crate::error::ValidationError;
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Paper widths (mm) the receipt layout supports.
pub const SUPPORTED_PAPER_WIDTHS: [i32; 2] = [58, 80];

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (category, product, customer, user).
///
/// ## Rules
/// - Must not be blank
/// - At most 200 characters after trimming
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be blank
/// - Exactly one `@` with something on both sides
/// - At most 254 characters
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_email;
///
/// assert!(validate_email("garcom@bar.com").is_ok());
/// assert!(validate_email("garcom.bar.com").is_err());
/// assert!(validate_email("a@b@c").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let mut parts = email.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    };

    if !valid {
        return Err(ValidationError::invalid_format(
            "email",
            "must look like name@domain",
        ));
    }

    Ok(())
}

/// Validates a new password. Minimum 6 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }
    Ok(())
}

/// Validates an entity id passed by a client.
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Uuid::parse_str(value.trim())
        .map(|_| ())
        .map_err(|_| ValidationError::invalid_format(field, "must be a UUID"))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a product price. Free items (0) are allowed, up to
/// [`MAX_PRICE_CENTS`].
pub fn validate_price(price_cents: i64) -> ValidationResult<()> {
    if price_cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    if price_cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - At least 1
/// - At most [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

pub fn validate_table_number(number: i32) -> ValidationResult<()> {
    if number <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "number".to_string(),
        });
    }
    Ok(())
}

/// Validates a monetary amount that must be strictly positive and at most
/// [`MAX_AMOUNT_CENTS`].
pub fn validate_positive_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

pub fn validate_paper_width(width: i32) -> ValidationResult<()> {
    if !SUPPORTED_PAPER_WIDTHS.contains(&width) {
        return Err(ValidationError::NotAllowed {
            field: "paper_width".to_string(),
            allowed: SUPPORTED_PAPER_WIDTHS.iter().map(|w| w.to_string()).collect(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
