//! Error Handling
//!
//! Every handler returns `Result<_, AppError>`, and `AppError` always
//! renders as a structured JSON body:
//!
//! ```text
//! {"error": "<safe message>"}                       // most errors
//! {"error": "<safe message>", "field": "email"}     // validation errors
//! ```
//!
//! | Kind | Status | Message policy |
//! |---|---|---|
//! | `Validation` | 400 | names the offending field |
//! | `InvalidCredentials` | 400 | always "Invalid email or password" |
//! | `Conflict` | 400 | "... already exists" |
//! | `Unauthorized` | 401 | generic |
//! | `NotFound` | 404 | generic |
//! | `Internal` | 500 | always "Internal server error"; details logged only |
//!
//! Store and infrastructure failures are the only genuine faults. They are
//! logged server-side with their details and reported to the client
//! without any of them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;

use crate::password::PasswordError;
use crate::store::StoreError;
use crate::token::TokenError;
use crate::validation::ValidationError;

/// Message for every login failure, whether or not the email exists
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Message for requests that need a session and have none
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required";

/// Message returned for all internal errors
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

// ============================================================================
// Error Types
// ============================================================================

/// Error categories with their HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or invalid input (400)
    Validation,
    /// Login failed (400, generic message)
    InvalidCredentials,
    /// Unique constraint violated (400)
    Conflict,
    /// No usable session (401)
    Unauthorized,
    /// Resource missing (404)
    NotFound,
    /// Store or infrastructure fault (500)
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation | Self::InvalidCredentials | Self::Conflict => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation_error"),
            Self::InvalidCredentials => write!(f, "invalid_credentials"),
            Self::Conflict => write!(f, "conflict"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::NotFound => write!(f, "not_found"),
            Self::Internal => write!(f, "internal_error"),
        }
    }
}

/// Application error with a client-safe message
#[derive(Debug)]
pub struct AppError {
    /// Determines status and logging level
    pub kind: ErrorKind,
    /// User-facing message
    pub message: String,
    /// Offending input field, for validation errors
    pub field: Option<String>,
    /// Internal details (logged, never sent)
    pub details: Option<String>,
}

impl AppError {
    /// Create a new error
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    /// Invalid input (400)
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Invalid input on a specific field (400)
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::validation(message)
        }
    }

    /// Generic login failure (400)
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, INVALID_CREDENTIALS_MESSAGE)
    }

    /// Uniqueness conflict (400)
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Missing or unusable session (401)
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// The standard 401 for protected endpoints
    pub fn authentication_required() -> Self {
        Self::unauthorized(AUTH_REQUIRED_MESSAGE)
    }

    /// Resource not found (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Internal fault (500). `details` is logged only.
    pub fn internal(details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(ErrorKind::Internal, INTERNAL_ERROR_MESSAGE)
        }
    }

    fn log(&self) {
        let details = self.details.as_deref().unwrap_or("none");

        match self.kind {
            ErrorKind::Internal => {
                tracing::error!(
                    error_kind = %self.kind,
                    details = %details,
                    "Internal error"
                );
            }
            ErrorKind::Unauthorized | ErrorKind::InvalidCredentials => {
                tracing::warn!(
                    error_kind = %self.kind,
                    reason = %self.message,
                    "Auth error"
                );
            }
            _ => {
                tracing::debug!(
                    error_kind = %self.kind,
                    reason = %self.message,
                    field = ?self.field,
                    "Client error"
                );
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {}

// ============================================================================
// Error Response
// ============================================================================

/// JSON error body
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let message = match self.kind {
            ErrorKind::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => self.message,
        };

        let body = ErrorResponse {
            error: message,
            field: self.field,
        };

        (self.kind.status_code(), Json(body)).into_response()
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err.field {
            Some(field) => AppError::invalid_field(field, err.message),
            None => AppError::validation(err.message),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => AppError::conflict("Email already exists"),
            StoreError::NotFound => AppError::not_found("User not found"),
            other => AppError::internal(other.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::internal(err.to_string())
    }
}

/// Result alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
