//! # Error Types
//!
//! Domain-specific error types for barbearia-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  barbearia-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  barbearia-db errors (separate crate)                                  │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  server errors (in app)                                                │
//! │  └── ApiError         - What HTTP clients see (JSON body + status)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::appointment::AppointmentStatus;
use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale line item references a product that does not exist or is inactive.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Professional not found: {0}")]
    ProfessionalNotFound(String),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error("Time slot not found: {0}")]
    SlotNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// A size bucket holds fewer units than a line item asks for.
    ///
    /// Only raised under [`OversellPolicy::Reject`](crate::stock::OversellPolicy).
    /// The default policy clamps the bucket to zero instead.
    #[error(
        "Insufficient stock for {product_id} size {bucket}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: String,
        bucket: String,
        available: i64,
        requested: i64,
    },

    /// The appointment status graph does not allow this move.
    ///
    /// ```text
    /// pending ──► confirmed ──► in_progress ──► completed
    ///    │            │
    ///    │            ├──► no_show
    ///    ▼            ▼
    /// canceled ◄──────┘
    /// ```
    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    /// The slot matching a booking request is already taken.
    #[error("Time slot {time} on {date} is not available for professional {professional_id}")]
    SlotUnavailable {
        professional_id: String,
        date: String,
        time: String,
    },

    #[error("Service is not available for booking: {0}")]
    ServiceUnavailable(String),

    #[error("Professional is not active: {0}")]
    ProfessionalInactive(String),

    /// The shop is closed, so public booking and listing are refused.
    #[error("The shop is currently closed")]
    ShopClosed,

    #[error("A sale must contain at least one item")]
    EmptySale,

    #[error("A sale cannot have more than {max} items")]
    SaleTooLarge { max: usize },

    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountExceedsSubtotal { discount: Money, subtotal: Money },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for the "entity is missing" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_)
                | CoreError::ServiceNotFound(_)
                | CoreError::ProfessionalNotFound(_)
                | CoreError::AppointmentNotFound(_)
                | CoreError::SlotNotFound(_)
                | CoreError::SaleNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business rule runs, usually while parsing request
/// payloads into domain values.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unparseable date, bad "HH:MM" time).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "camiseta-preta".to_string(),
            bucket: "M".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for camiseta-preta size M: available 3, requested 5"
        );

        let err = CoreError::InvalidStatusTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Cannot change appointment status from completed to pending"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("client_name");
        assert_eq!(err.to_string(), "client_name is required");

        let err = ValidationError::invalid_format("start_time", "expected HH:MM");
        assert_eq!(
            err.to_string(),
            "start_time has invalid format: expected HH:MM"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("phone").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
    }

    #[test]
    fn test_is_not_found() {
        assert!(CoreError::ProductNotFound("x".into()).is_not_found());
        assert!(CoreError::SlotNotFound("x".into()).is_not_found());
        assert!(!CoreError::ShopClosed.is_not_found());
    }
}
