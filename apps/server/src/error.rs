//! # API Errors
//!
//! Every handler returns `ApiResult<T>`. Errors from the lower layers are
//! converted here, once, into a status code and a JSON body.
//!
//! ```text
//! ValidationError ─┐
//! CoreError ───────┼──► ApiError { code, message, details } ──► (status, JSON)
//! DbError ─────────┤
//! JwtError ────────┤        {"error": "...", "code": "NOT_FOUND", "details": ...}
//! axum rejections ─┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use comanda_core::{CoreError, ValidationError};
use comanda_db::DbError;

use crate::auth::JwtError;

/// Message returned for every 500, whatever the cause.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error!";

/// Machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InvalidOperation,
    Unauthorized,
    Forbidden,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::InvalidOperation => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_server_fault(&self) -> bool {
        matches!(self, ErrorCode::DatabaseError | ErrorCode::Internal)
    }
}

/// Error returned by services and handlers.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidOperation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// `Invalid <name> id`, for malformed UUIDs in paths, queries and bodies.
    pub fn invalid_id(name: &str) -> Self {
        Self::validation(format!("Invalid {name} id"))
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if self.code.is_server_fault() {
            error!(code = ?self.code, cause = %self.message, "Request failed");
            INTERNAL_ERROR_MESSAGE
        } else {
            self.message.as_str()
        };

        let body = ErrorBody {
            error: message,
            code: self.code,
            details: if self.code.is_server_fault() {
                None
            } else {
                self.details.as_ref()
            },
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field.clone(),
        };
        ApiError::validation(err.to_string()).with_details(json!({ "field": field }))
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => v.into(),
            other => ApiError::invalid_operation(other.to_string()),
        }
    }
}

/// ## Mapping
/// ```text
/// NotFound             → 404
/// UniqueViolation      → 400 VALIDATION_ERROR
/// ForeignKeyViolation  → 400 INVALID_OPERATION (still referenced)
/// Domain               → same as the CoreError
/// anything else        → 500
/// ```
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::not_found(format!("{entity} not found")),
            DbError::UniqueViolation { .. } => ApiError::validation(err.to_string()),
            DbError::ForeignKeyViolation { .. } => {
                ApiError::invalid_operation("Record is still referenced by other records")
            }
            DbError::Domain(core) => core.into(),
            other => ApiError::new(ErrorCode::DatabaseError, other.to_string()),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Encode(msg) => ApiError::internal(format!("Failed to sign token: {msg}")),
            other => {
                warn!(error = %other, "Rejected bearer token");
                ApiError::unauthorized("Invalid or expired token")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::invalid_operation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::internal("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Order", "123").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Order not found");

        let err: ApiError = DbError::duplicate("email", "a@b.com").into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: ApiError = DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::InvalidOperation);

        let err: ApiError = DbError::from(CoreError::InsufficientDrawer {
            available: 100,
            requested: 500,
        })
        .into();
        assert_eq!(err.code, ErrorCode::InvalidOperation);
        assert_eq!(err.message, "Drawer has 100 but 500 was requested");

        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn test_validation_error_carries_field() {
        let err: ApiError = ValidationError::required("name").into();
        assert_eq!(err.message, "name is required");
        assert_eq!(err.details, Some(json!({ "field": "name" })));
    }

    #[test]
    fn test_core_error_is_invalid_operation() {
        let err: ApiError = CoreError::InsufficientPayment {
            due: 100,
            received: 50,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InvalidOperation);
    }

    #[test]
    fn test_invalid_id_message() {
        assert_eq!(ApiError::invalid_id("order").message, "Invalid order id");
    }
}
