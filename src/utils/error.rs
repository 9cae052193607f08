//! Error Handling Utilities
//!
//! Error taxonomy for the directory API and its translation into the JSON
//! response envelope.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::store::{Constraint, StoreError};

/// Main application error type surfaced by every service and handler
#[derive(Error, Debug)]
pub enum AppError {
    /// Field constraint violations on user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unique constraint collision in the store
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Reset token that is unknown, already consumed or expired
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller lacking the required role or ownership
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Geocoder, mail or file store failures
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    HashingError(#[from] bcrypt::BcryptError),

    /// Generic internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Error body of the response envelope
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            success: false,
            error: message.to_string(),
        }
    }
}

impl AppError {
    /// HTTP status the error maps to at the boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateKey(_) | AppError::InvalidToken(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UpstreamFailure(_)
            | AppError::Database(_)
            | AppError::HashingError(_)
            | AppError::Internal(_)
            | AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to clients
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::DuplicateKey(msg)
            | AppError::InvalidToken(msg)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::UpstreamFailure(msg) => msg.clone(),
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::HashingError(_) => "Password hashing error".to_string(),
            AppError::Internal(_) => "Server Error".to_string(),
            AppError::Configuration(_) => "Server configuration error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }

        let error_response = ErrorResponse::new(&self.client_message());
        (status, Json(error_response)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(constraint) => AppError::DuplicateKey(match constraint {
                Constraint::UserEmail => "Email already exists".to_string(),
                Constraint::RestaurantName => "Restaurant name already exists".to_string(),
                Constraint::RestaurantOwner => {
                    "User has already published a restaurant".to_string()
                }
                Constraint::ReviewAuthor => {
                    "User has already submitted a review for this restaurant".to_string()
                }
            }),
            StoreError::UserOwnsRestaurant => AppError::Validation(
                "User still owns a restaurant and cannot be deleted".to_string(),
            ),
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Corrupt(msg) => AppError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();

        for (field, errors) in err.field_errors() {
            for error in errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for field '{}'", field));
                messages.push(message);
            }
        }
        messages.sort();

        AppError::Validation(messages.join(", "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Result type alias for operations that can return AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Please add a name"))]
        name: String,
        #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
        rating: i32,
    }

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new("Test message");
        assert!(!error.success);
        assert_eq!(error.error, "Test message");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DuplicateKey("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::UpstreamFailure("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let error = AppError::Internal("connection string leaked".into());
        assert_eq!(error.client_message(), "Server Error");
    }

    #[test]
    fn test_validation_errors_list_every_field() {
        let sample = Sample {
            name: String::new(),
            rating: 11,
        };
        let err: AppError = sample.validate().unwrap_err().into();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("Please add a name"));
                assert!(msg.contains("Rating must be between 1 and 10"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_constraint_messages() {
        let err: AppError = StoreError::Duplicate(Constraint::ReviewAuthor).into();
        assert!(matches!(err, AppError::DuplicateKey(_)));
        assert_eq!(
            err.client_message(),
            "User has already submitted a review for this restaurant"
        );
    }

    #[test]
    fn test_owned_restaurant_blocks_deletion_as_bad_request() {
        let err: AppError = StoreError::UserOwnsRestaurant.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.client_message(),
            "User still owns a restaurant and cannot be deleted"
        );
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::Validation("Invalid email".to_string());
        assert_eq!(error.to_string(), "Validation error: Invalid email");
    }
}
