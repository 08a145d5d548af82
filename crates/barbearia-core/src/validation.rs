//! # Validation Module
//!
//! Input validation for request payloads before business rules run.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: HTTP handler (serde)                                          │
//! │  └── Shape and types of the JSON body                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Lengths, ranges, phone/email shape, identifiers                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  └── UNIQUE (slot identity, customer phone)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{
    MAX_ITEM_QUANTITY, MAX_PERIOD_DAYS, MAX_PRICE_CENTS, MAX_SLOT_INTERVAL_MINUTES, MAX_STOCK_PER_SIZE,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name (client, product, service, ...).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters
///
/// ```rust
/// use barbearia_core::validation::validate_name;
///
/// assert!(validate_name("nome", "Corte Masculino", 100).is_ok());
/// assert!(validate_name("nome", "   ", 100).is_err());
/// ```
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional free-text field (notes, description).
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a phone number.
///
/// ## Rules
/// - Only digits, spaces, `+`, `-`, `(` and `)`
/// - Between 8 and 15 digits
///
/// ```rust
/// use barbearia_core::validation::validate_phone;
///
/// assert!(validate_phone("(11) 98765-4321").is_ok());
/// assert!(validate_phone("+55 11 98765 4321").is_ok());
/// assert!(validate_phone("1234").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::required("phone"));
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
    {
        return Err(ValidationError::invalid_format(
            "phone",
            "must contain only digits, spaces, +, -, ( and )",
        ));
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(8..=15).contains(&digits) {
        return Err(ValidationError::OutOfRange {
            field: "phone digits".to_string(),
            min: 8,
            max: 15,
        });
    }

    Ok(())
}

/// Reduces a phone number to its digits, the key customers are matched on.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Loose e-mail shape check: `local@domain.tld`, no spaces.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::invalid_format("email", "must look like name@example.com"));
    }
    Ok(())
}

/// Validates a search query; empty is allowed and means "everything".
///
/// Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a UUID string.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ValidationError::invalid_format(field, "must be a valid UUID"))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity: `1..=MAX_ITEM_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in centavos: `0..=MAX_PRICE_CENTS`.
///
/// Zero is allowed (courtesy items).
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates a stock counter: `0..=MAX_STOCK_PER_SIZE`.
pub fn validate_stock_count(field: &str, count: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_PER_SIZE).contains(&count) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_PER_SIZE,
        });
    }
    Ok(())
}

/// Validates a slot interval: `1..=MAX_SLOT_INTERVAL_MINUTES`.
pub fn validate_interval_minutes(interval: u32) -> ValidationResult<()> {
    if interval == 0 {
        return Err(ValidationError::MustBePositive {
            field: "interval_minutes".to_string(),
        });
    }

    if interval > MAX_SLOT_INTERVAL_MINUTES {
        return Err(ValidationError::OutOfRange {
            field: "interval_minutes".to_string(),
            min: 1,
            max: i64::from(MAX_SLOT_INTERVAL_MINUTES),
        });
    }

    Ok(())
}

/// Validates a service duration (5 minutes to 8 hours).
pub fn validate_duration_minutes(minutes: i64) -> ValidationResult<()> {
    if !(5..=480).contains(&minutes) {
        return Err(ValidationError::OutOfRange {
            field: "duration_minutes".to_string(),
            min: 5,
            max: 480,
        });
    }
    Ok(())
}

/// Validates a reporting window in days: `1..=MAX_PERIOD_DAYS`.
pub fn validate_period_days(days: u32) -> ValidationResult<()> {
    if days == 0 || days > MAX_PERIOD_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "days".to_string(),
            min: 1,
            max: i64::from(MAX_PERIOD_DAYS),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("nome", "Barba", 100).is_ok());
        assert!(validate_name("nome", "", 100).is_err());
        assert!(validate_name("nome", &"a".repeat(101), 100).is_err());
        // counts characters, not bytes
        assert!(validate_name("nome", &"ç".repeat(100), 100).is_ok());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("11987654321").is_ok());
        assert!(validate_phone("(11) 98765-4321").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("11 9876x4321").is_err());
        assert!(validate_phone("1234567").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+55 (11) 98765-4321"), "5511987654321");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cliente@email.com").is_ok());
        assert!(validate_email("cliente@email").is_err());
        assert!(validate_email("@email.com").is_err());
        assert!(validate_email("cli ente@email.com").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_interval_minutes() {
        assert!(validate_interval_minutes(30).is_ok());
        assert!(matches!(
            validate_interval_minutes(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_interval_minutes(MAX_SLOT_INTERVAL_MINUTES + 1).is_err());
    }

    #[test]
    fn test_validate_counts_and_prices() {
        assert!(validate_price_cents("price", 0).is_ok());
        assert!(validate_price_cents("price", -1).is_err());
        assert!(validate_stock_count("stock_m", 0).is_ok());
        assert!(validate_stock_count("stock_m", -1).is_err());
        assert!(validate_price_cents("price", MAX_PRICE_CENTS).is_ok());
        assert!(validate_price_cents("price", MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price_cents("price", i64::MAX / 2).is_err());
        assert!(validate_stock_count("stock_m", MAX_STOCK_PER_SIZE).is_ok());
        assert!(validate_stock_count("stock_m", i64::MAX).is_err());
    }

    #[test]
    fn test_validate_period_days() {
        assert!(validate_period_days(30).is_ok());
        assert!(validate_period_days(0).is_err());
        assert!(validate_period_days(MAX_PERIOD_DAYS + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }
}
