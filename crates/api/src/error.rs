//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// The request carried no resolvable user identity.
    Unauthenticated,
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Business-rule or storage failure from the domain.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::NoActiveCart { .. }
        | DomainError::ItemNotInCart { .. }
        | DomainError::AddressNotFound { .. }
        | DomainError::ProductNotFound { .. }
        | DomainError::OrderNotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::EmptyCart
        | DomainError::DuplicateItem { .. }
        | DomainError::OutOfStock { .. }
        | DomainError::InsufficientStock { .. }
        | DomainError::AlreadyZero { .. } => StatusCode::BAD_REQUEST,
        DomainError::Store(StoreError::VersionConflict { .. }) => StatusCode::CONFLICT,
        DomainError::Store(_) => {
            tracing::error!(error = %err, "storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
