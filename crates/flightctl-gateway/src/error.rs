//! API error responses.
//!
//! Store errors are mapped to HTTP statuses here; everything internal is
//! logged with its detail and collapsed into an opaque 500 for the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use flightctl_api::ApiStatus;
use flightctl_core::StoreError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request body or parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with the current state of the resource.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiStatus::failure(self.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ResourceNotFound => Self::NotFound("resource not found".to_string()),
            StoreError::DuplicateName
            | StoreError::ResourceVersionConflict
            | StoreError::NoRowsUpdated
            | StoreError::UpdatingResourceWithOwnerNotAllowed => Self::Conflict(err.to_string()),
            StoreError::ResourceIsNil
            | StoreError::ResourceNameIsNil
            | StoreError::IllegalResourceVersionFormat => Self::BadRequest(err.to_string()),
            StoreError::Database(_) | StoreError::Serialization(_) => {
                tracing::error!(error = %err, "store error");
                Self::Internal("storage error".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_expected_statuses() {
        let cases = [
            (StoreError::ResourceNotFound, StatusCode::NOT_FOUND),
            (StoreError::DuplicateName, StatusCode::CONFLICT),
            (StoreError::ResourceVersionConflict, StatusCode::CONFLICT),
            (StoreError::NoRowsUpdated, StatusCode::CONFLICT),
            (
                StoreError::UpdatingResourceWithOwnerNotAllowed,
                StatusCode::CONFLICT,
            ),
            (StoreError::ResourceIsNil, StatusCode::BAD_REQUEST),
            (StoreError::ResourceNameIsNil, StatusCode::BAD_REQUEST),
            (
                StoreError::IllegalResourceVersionFormat,
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::Database("oops".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let err = ApiError::from(StoreError::Database("secret dsn".to_string()));
        assert!(!err.to_string().contains("secret dsn"));
    }
}
