//! Error handling for read-only routes.
//!
//! Mutations report through [`crate::mutation::Outcome`]; this type covers
//! listing pages and other handlers outside that pipeline.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::db::RepositoryError;
use crate::mutation::{GENERIC_FAILURE, failure};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Request could not be tied to a shop.
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Database(_) | Self::Template(_) => {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request error"
                );
                failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_FAILURE.to_owned(),
                    None,
                )
            }
            Self::Unauthorized(_) => failure(StatusCode::UNAUTHORIZED, self.to_string(), None),
            Self::NotFound(_) => failure(StatusCode::NOT_FOUND, self.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("style".to_string());
        assert_eq!(err.to_string(), "Not found: style");

        let err = AppError::Unauthorized(AuthError::Expired);
        assert_eq!(err.to_string(), "Unauthorized: session token expired");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized(AuthError::MissingToken)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption(
                "bad row".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
