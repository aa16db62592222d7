//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{AuthError, CalculationServiceError};

/// Message for both missing and foreign calculations.
const CALCULATION_NOT_FOUND: &str = "calculation not found";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Calculation operation failed.
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationServiceError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request carries no usable bearer credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request body or path could not be extracted.
    #[error("Rejected request: {message}")]
    Rejected {
        /// Status chosen by the extractor (400 or 422).
        status: StatusCode,
        /// Extractor's explanation.
        message: String,
    },
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Calculation(err) => match err {
                CalculationServiceError::Calculation(_) => StatusCode::BAD_REQUEST,
                CalculationServiceError::NotFound(_) | CalculationServiceError::Forbidden(_) => {
                    StatusCode::NOT_FOUND
                }
                CalculationServiceError::UnknownOwner(_) => StatusCode::UNAUTHORIZED,
                CalculationServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::UserNotFound
                | AuthError::InvalidToken
                | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::TokenEncoding(_) | AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Rejected { status, .. } => *status,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Calculation(err) => match err {
                CalculationServiceError::Calculation(e) => e.to_string(),
                CalculationServiceError::NotFound(_) | CalculationServiceError::Forbidden(_) => {
                    CALCULATION_NOT_FOUND.to_string()
                }
                CalculationServiceError::UnknownOwner(_) => "Invalid token".to_string(),
                CalculationServiceError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                // A token for a deleted account is simply no longer valid
                AuthError::UserNotFound | AuthError::InvalidToken => "Invalid token".to_string(),
                AuthError::TokenExpired => "Token expired".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(e) => format!("Invalid email address: {e}"),
                AuthError::TokenEncoding(_) | AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Unauthorized(message) | Self::Rejected { message, .. } => message.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({ "error": self.client_message() }));
        let mut response = (status, body).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use abacus_core::{CalculationError, CalculationId};
    use http_body_util::BodyExt;

    use super::*;
    use crate::db::RepositoryError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Unauthorized("missing bearer token".to_string());
        assert_eq!(err.to_string(), "Unauthorized: missing bearer token");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Rejected {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: "test".to_string(),
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AuthError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::TokenExpired.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(
                CalculationServiceError::from(CalculationError::DivisionByZero { index: 1 }).into()
            ),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_not_found_and_forbidden_are_identical() {
        let id = CalculationId::generate();
        let missing = AppError::from(CalculationServiceError::NotFound(id)).into_response();
        let foreign = AppError::from(CalculationServiceError::Forbidden(id)).into_response();

        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(missing).await,
            serde_json::json!({ "error": "calculation not found" })
        );
        assert_eq!(
            body_json(foreign).await,
            serde_json::json!({ "error": "calculation not found" })
        );
    }

    #[tokio::test]
    async fn test_unauthorized_carries_challenge() {
        let response = AppError::from(AuthError::InvalidToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response = AppError::from(CalculationServiceError::Repository(
            RepositoryError::DataCorruption("calculation 1: bad row".to_string()),
        ))
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Internal server error" })
        );
    }
}
