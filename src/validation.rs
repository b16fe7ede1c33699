//! Input Validation
//!
//! Request bodies are checked for shape before any handler logic runs.
//! A body type implements [`Validate`] and is extracted with
//! [`ValidatedJson`]; a body that is not JSON, or does not deserialize,
//! is rejected with 400 `"Invalid input data"`, and a body that fails
//! validation is rejected with 400 and the offending field.
//!
//! # Usage
//!
//! ```ignore
//! use latchkey::validation::{validate_email, validate_min_length, Validate, ValidatedJson, ValidationError};
//!
//! #[derive(serde::Deserialize)]
//! struct Signup {
//!     name: String,
//!     email: String,
//! }
//!
//! impl Validate for Signup {
//!     fn validate(&self) -> Result<(), ValidationError> {
//!         validate_min_length(&self.name, 2, "name")?;
//!         validate_email(&self.email)?;
//!         Ok(())
//!     }
//! }
//!
//! async fn signup(ValidatedJson(body): ValidatedJson<Signup>) -> String {
//!     body.email
//! }
//! ```

use std::fmt;

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Message for bodies that cannot be parsed at all
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input data";

/// Message for a malformed email address
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";

/// Validation error with field context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Field that failed validation (if applicable)
    pub field: Option<String>,
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,
    /// Human-readable message
    pub message: String,
}

impl ValidationError {
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            field: None,
            code,
            message: message.into(),
        }
    }

    pub fn for_field(
        field: impl Into<String>,
        code: ValidationErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: Some(field.into()),
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// Value is required but empty
    Required,
    /// Value is too short
    TooShort,
    /// Email format is invalid
    InvalidEmail,
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::TooShort => write!(f, "too_short"),
            Self::InvalidEmail => write!(f, "invalid_email"),
        }
    }
}

/// Trait for validatable request bodies
pub trait Validate {
    /// Validate the instance, returning the first failure
    fn validate(&self) -> Result<(), ValidationError>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

// ============================================================================
// String Validators
// ============================================================================

/// `"password"` -> `"Password"`
fn label(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reject an empty value
///
/// Whitespace counts as content: a password of spaces is still a password.
pub fn validate_required(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::for_field(
            field,
            ValidationErrorCode::Required,
            format!("{} is required", label(field)),
        ));
    }
    Ok(())
}

/// Require at least `min` characters
pub fn validate_min_length(value: &str, min: usize, field: &str) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(ValidationError::for_field(
            field,
            ValidationErrorCode::TooShort,
            format!("{} must be at least {} characters", label(field), min),
        ));
    }
    Ok(())
}

/// Validate email syntax
///
/// Pragmatic rather than RFC 5322 complete: one `@`, a sane local part,
/// and a dotted domain. Deliverability is not checked.
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    let invalid =
        || ValidationError::for_field("email", ValidationErrorCode::InvalidEmail, INVALID_EMAIL_MESSAGE);

    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if domain.contains('@') {
        return Err(invalid());
    }

    if local.is_empty() || local.len() > 64 {
        return Err(invalid());
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err(invalid());
    }
    if local.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }

    if domain.is_empty() || domain.len() > 255 {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }
    if domain.contains("..") {
        return Err(invalid());
    }
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(invalid());
    }

    Ok(())
}

/// Escape HTML special characters for safe display
pub fn escape_html(input: &str) -> String {
    let mut result = String::with_capacity(input.len() * 2);
    for c in input.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

// ============================================================================
// Axum Extractor
// ============================================================================

/// JSON body extractor that runs [`Validate`] before the handler sees it
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            tracing::debug!(error = %e, "JSON body rejected");
            AppError::validation(INVALID_INPUT_MESSAGE)
        })?;

        if let Err(error) = value.validate() {
            tracing::debug!(
                field = ?error.field,
                code = %error.code,
                "Validation failed"
            );
            return Err(error.into());
        }

        Ok(ValidatedJson(value))
    }
}
