//! HTTP mapping of domain failures.

use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The upstream identity layer did not supply a subject.
    #[error("missing x-user-id header")]
    Unauthenticated,

    /// Path or body failed to parse before reaching the domain.
    #[error("malformed request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Domain(DomainError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT")
            }
            ApiError::Domain(DomainError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Domain(DomainError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        }
    }
}

/// Malformed path segments (e.g. a non-UUID id) get the JSON error body too.
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        let cases = [
            (ApiError::from(DomainError::invalid("bad")), StatusCode::BAD_REQUEST),
            (ApiError::from(DomainError::not_found("Tool", "x")), StatusCode::NOT_FOUND),
            (ApiError::from(DomainError::storage("down")), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Unauthenticated, StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
