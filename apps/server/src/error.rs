//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Server                             │
//! │                                                                         │
//! │  Handler                                                                │
//! │  Result<Json<T>, ApiError>                                              │
//! │         │                                                               │
//! │         ├── ValidationError ─────────► 400 VALIDATION_ERROR             │
//! │         ├── *NotFound ───────────────► 404 NOT_FOUND                    │
//! │         ├── InvalidStatusTransition ─► 409 CONFLICT                     │
//! │         ├── SlotUnavailable ─────────► 409 CONFLICT                     │
//! │         ├── InsufficientStock ───────► 409 INSUFFICIENT_STOCK           │
//! │         ├── other business rules ────► 422 BUSINESS_LOGIC               │
//! │         ├── ShopClosed ──────────────► 503 SHOP_CLOSED                  │
//! │         └── database failures ───────► 500 DATABASE_ERROR (logged)      │
//! │                                                                         │
//! │  Body: { "code": "NOT_FOUND", "message": "Service not found: 42" }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Internal causes are logged and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use barbearia_core::{CoreError, ValidationError};
use barbearia_db::DbError;
use serde::Serialize;

/// What clients receive when a request fails.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// State conflict: illegal transition, slot taken, stale write (409)
    Conflict,

    /// Oversell under the reject policy (409)
    InsufficientStock,

    /// Business rule violated (422)
    BusinessLogic,

    /// Shop closed for public operations (503)
    ShopClosed,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict | ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::BusinessLogic => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::ShopClosed => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match err {
            CoreError::ProductNotFound(_)
            | CoreError::ServiceNotFound(_)
            | CoreError::ProfessionalNotFound(_)
            | CoreError::AppointmentNotFound(_)
            | CoreError::SlotNotFound(_)
            | CoreError::SaleNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidStatusTransition { .. } | CoreError::SlotUnavailable { .. } => {
                ErrorCode::Conflict
            }
            CoreError::ShopClosed => ErrorCode::ShopClosed,
            CoreError::QuantityTooLarge { .. } | CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::ServiceUnavailable(_)
            | CoreError::ProfessionalInactive(_)
            | CoreError::EmptySale
            | CoreError::SaleTooLarge { .. }
            | CoreError::DiscountExceedsSubtotal { .. } => ErrorCode::BusinessLogic,
        };
        ApiError::new(code, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => e.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!(message = %message, "Foreign key violation");
                ApiError::new(ErrorCode::Conflict, "Record is referenced by other records")
            }
            DbError::Conflict(reason) => {
                tracing::warn!(reason = %reason, "Concurrent modification");
                ApiError::new(ErrorCode::Conflict, "Record was modified concurrently, try again")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy")
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use barbearia_core::AppointmentStatus;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (CoreError::ServiceNotFound("x".into()).into(), StatusCode::NOT_FOUND),
            (ValidationError::required("name").into(), StatusCode::BAD_REQUEST),
            (
                CoreError::InvalidStatusTransition {
                    from: AppointmentStatus::Completed,
                    to: AppointmentStatus::Pending,
                }
                .into(),
                StatusCode::CONFLICT,
            ),
            (CoreError::EmptySale.into(), StatusCode::UNPROCESSABLE_ENTITY),
            (CoreError::ShopClosed.into(), StatusCode::SERVICE_UNAVAILABLE),
            (DbError::Conflict("v".into()).into(), StatusCode::CONFLICT),
            (DbError::QueryFailed("boom".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.code.status(), status, "{error}");
        }
    }

    #[test]
    fn test_internal_details_hidden() {
        let err: ApiError = DbError::QueryFailed("no such column: secret".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("secret"));

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "DATABASE_ERROR");
    }

    #[test]
    fn test_domain_errors_pass_through_db_error() {
        let err: ApiError = DbError::Domain(CoreError::ShopClosed).into();
        assert_eq!(err.code, ErrorCode::ShopClosed);
    }
}
