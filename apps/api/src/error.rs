//! Error types for the REST API.
//!
//! Every failure leaves the server as
//! `{"success": false, "message": "...", "detail"?: "..."}` with the status
//! of its [`ErrorCode`]. `detail` is only attached to internal errors and
//! only in development (see [`expose_error_detail`]).

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tillpoint_core::{CoreError, ValidationError};
use tillpoint_db::DbError;
use tracing::error;

/// Error categories and their HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequest,
    NotFound,
    InsufficientStock,
    Unauthorized,
    Forbidden,
    Conflict,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API errors.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// Underlying cause of an internal error.
    pub detail: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// A 500 with a generic message; `cause` is logged and kept as detail.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        ApiError {
            code: ErrorCode::Internal,
            message: "Internal server error".to_string(),
            detail: Some(cause.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::invalid(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_)
            | CoreError::CustomerNotFound(_)
            | CoreError::SaleNotFound(_) => ApiError::not_found(err.to_string()),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::Validation(inner) => inner.into(),
            CoreError::EmptyCart
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::AmountOutOfRange => ApiError::invalid(err.to_string()),
            CoreError::Storage(msg) => ApiError::internal(msg),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::not_found(format!("{entity} not found")),
            DbError::UniqueViolation { .. } | DbError::Conflict(_) => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => {
                ApiError::new(ErrorCode::Conflict, "Request conflicts with existing data")
            }
            other => ApiError::internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

/// Detail of an internal error, carried in response extensions so that
/// [`expose_error_detail`] can put it in the body in development.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if self.code == ErrorCode::Internal {
            error!(
                message = %self.message,
                detail = self.detail.as_deref().unwrap_or_default(),
                "Request failed"
            );
        }

        let body = ErrorBody {
            success: false,
            message: &self.message,
            detail: None,
        };
        let mut response = (status, Json(body)).into_response();
        if let (ErrorCode::Internal, Some(detail)) = (self.code, self.detail) {
            response.extensions_mut().insert(ErrorDetail {
                message: self.message,
                detail,
            });
        }
        response
    }
}

/// Response mapper installed in development: rewrites internal error
/// bodies to include their detail.
pub async fn expose_error_detail(response: Response) -> Response {
    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };
    let body = ErrorBody {
        success: false,
        message: &detail.message,
        detail: Some(&detail.detail),
    };
    (response.status(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_statuses() {
        let cases = [
            (CoreError::EmptyCart, StatusCode::BAD_REQUEST),
            (CoreError::ProductNotFound("p1".into()), StatusCode::NOT_FOUND),
            (
                CoreError::InsufficientStock {
                    product: "Mug".into(),
                    available: 1,
                    requested: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::AmountOutOfRange, StatusCode::BAD_REQUEST),
            (CoreError::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).code.status(), status);
        }
    }

    #[test]
    fn test_db_error_statuses() {
        let dup = ApiError::from(DbError::UniqueViolation {
            field: "products.sku".into(),
        });
        assert_eq!(dup.code, ErrorCode::Conflict);
        assert_eq!(dup.message, "Duplicate products.sku: already exists");

        let internal = ApiError::from(DbError::PoolExhausted);
        assert_eq!(internal.code, ErrorCode::Internal);
        assert_eq!(internal.message, "Internal server error");
        assert_eq!(internal.detail.as_deref(), Some("Connection pool exhausted"));
    }

    #[test]
    fn test_internal_detail_moves_to_extensions() {
        let response = ApiError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert_eq!(detail.detail, "boom");

        let response = ApiError::not_found("Sale not found").into_response();
        assert!(response.extensions().get::<ErrorDetail>().is_none());
    }
}
