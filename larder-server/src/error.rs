//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use larder_core::{QueryError, ValidationError};
use larder_store::StoreError;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    /// Build from an extractor rejection message, naming the field when the
    /// deserializer reported one (e.g. "missing field `name`"), otherwise
    /// `fallback_field`.
    pub fn from_rejection(message: String, fallback_field: &str) -> Self {
        let field = message
            .split('`')
            .nth(1)
            .filter(|_| message.contains("field `"))
            .unwrap_or(fallback_field)
            .to_string();
        Self { field, message }
    }
}

impl From<ValidationError> for FieldError {
    fn from(e: ValidationError) -> Self {
        Self {
            field: e.field().to_string(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    InvalidParameter(#[from] QueryError),

    #[error("Recipe not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<Vec<ValidationError>> for ApiError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ApiError::Validation(errors.into_iter().map(FieldError::from).collect())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(fields) => {
                warn!("Rejected request: {:?}", fields);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "detail": fields })),
                )
                    .into_response()
            }
            ApiError::InvalidParameter(e) => {
                warn!("Rejected search: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "detail": e.to_string() })),
                )
                    .into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Recipe not found" })),
            )
                .into_response(),
            ApiError::Store(e) => {
                error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_missing_field_message() {
        let e = FieldError::from_rejection(
            "Failed to deserialize the JSON body into the target type: missing field `name` at line 1 column 2"
                .to_string(),
            "body",
        );
        assert_eq!(e.field, "name");
    }

    #[test]
    fn test_field_falls_back_to_body() {
        let e = FieldError::from_rejection(
            "Expected request with `Content-Type: application/json`".to_string(),
            "body",
        );
        assert_eq!(e.field, "body");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(QueryError::InvalidPage(-1))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(vec![ValidationError::EmptyField("name")])
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
