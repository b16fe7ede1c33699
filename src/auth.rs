//! Auth Endpoints
//!
//! | Route | Body | Success | Failure |
//! |---|---|---|---|
//! | `POST /api/auth/register` | `{name, email, password}` | 201 user + cookie | 400 invalid input or email exists |
//! | `POST /api/auth/login` | `{email, password}` | 200 user + cookie | 400 "Invalid email or password" |
//! | `POST /api/auth/logout` | none | 200 message + clearing cookie | |
//! | `GET /api/auth/me` | cookie | 200 user | 401 "Authentication required" |
//!
//! Responses carry the [`PublicUser`] projection; the password hash never
//! leaves the store boundary.
//!
//! Login reports one message whether the email is unknown or the password
//! is wrong. Who-am-i re-reads the store instead of trusting the claim, so
//! a deleted account stops resolving even while its token is still valid.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::observability::{auth_event, AuthEvent};
use crate::session::Authenticated;
use crate::store::{NewUser, PublicUser, StoreError, UserRecord};
use crate::token::SessionClaim;
use crate::validation::{validate_email, validate_min_length, validate_required, Validate, ValidatedJson, ValidationError};

/// Conflict message for registration
pub const USER_EXISTS_MESSAGE: &str = "User with this email already exists";

/// Body of a successful logout
pub const LOGGED_OUT_MESSAGE: &str = "Logged out successfully";

pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_PASSWORD_LENGTH: usize = 8;

// ============================================================================
// Request Bodies
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_min_length(&self.name, MIN_NAME_LENGTH, "name")?;
        validate_email(&self.email)?;
        validate_min_length(&self.password, MIN_PASSWORD_LENGTH, "password")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_email(&self.email)?;
        validate_required(&self.password, "password")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> Result<Response> {
    // Fast path only; the store's unique constraint decides
    if state.store.find_by_email(&input.email).await?.is_some() {
        auth_event!(AuthEvent::RegistrationConflict, "Registration refused");
        return Err(AppError::conflict(USER_EXISTS_MESSAGE));
    }

    let password_hash = state.hasher.hash_blocking(input.password).await?;

    let user = state
        .store
        .create(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict { constraint } => {
                auth_event!(
                    AuthEvent::RegistrationConflict,
                    constraint = ?constraint,
                    "Registration lost a uniqueness race"
                );
                AppError::conflict(USER_EXISTS_MESSAGE)
            }
            other => other.into(),
        })?;

    auth_event!(AuthEvent::UserRegistered, user_id = %user.id, "User registered");

    start_session(&state, StatusCode::CREATED, &user)
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> Result<Response> {
    let Some(user) = state.store.find_by_email(&input.email).await? else {
        auth_event!(AuthEvent::LoginFailed, "Login rejected");
        return Err(AppError::invalid_credentials());
    };

    let matches = state
        .hasher
        .verify_blocking(input.password, user.password_hash.clone())
        .await;
    if !matches {
        auth_event!(AuthEvent::LoginFailed, "Login rejected");
        return Err(AppError::invalid_credentials());
    }

    auth_event!(AuthEvent::LoginSucceeded, user_id = %user.id, "User logged in");

    start_session(&state, StatusCode::OK, &user)
}

/// `POST /api/auth/logout`
///
/// Needs no session. The token itself stays valid until it expires; only
/// the browser's copy is dropped.
pub async fn logout(State(state): State<AppState>) -> Response {
    auth_event!(AuthEvent::Logout, "Session cookie cleared");

    (
        StatusCode::OK,
        [(header::SET_COOKIE, state.sessions.cookies().encode_clear())],
        Json(MessageResponse {
            message: LOGGED_OUT_MESSAGE,
        }),
    )
        .into_response()
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    Authenticated(claim): Authenticated,
) -> Result<Json<PublicUser>> {
    let user = current_user(&state, &claim).await?;
    Ok(Json(PublicUser::from(&user)))
}

// ============================================================================
// Helpers
// ============================================================================

/// Load the user a verified claim points at
///
/// A claim for a user the store no longer has is treated as no session.
pub(crate) async fn current_user(state: &AppState, claim: &SessionClaim) -> Result<UserRecord> {
    match state.store.find_by_id(&claim.user_id).await? {
        Some(user) => Ok(user),
        None => {
            auth_event!(
                AuthEvent::SessionOrphaned,
                user_id = %claim.user_id,
                "Session names a missing user"
            );
            Err(AppError::authentication_required())
        }
    }
}

/// Issue a token for `user` and answer with the public projection plus cookie
fn start_session(state: &AppState, status: StatusCode, user: &UserRecord) -> Result<Response> {
    let claim = SessionClaim::new(user.id.clone(), user.email.clone());
    let token = state.sessions.codec().issue(&claim)?;
    let cookie = state.sessions.cookies().encode(&token);

    auth_event!(AuthEvent::SessionIssued, user_id = %user.id, "Session issued");

    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(PublicUser::from(user)),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_body(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(register_body("Ada", "ada@example.com", "12345678").is_valid());

        let err = register_body("A", "ada@example.com", "12345678").validate().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("name"));
        assert_eq!(err.message, "Name must be at least 2 characters");

        let err = register_body("Ada", "not-an-email", "12345678").validate().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("email"));

        let err = register_body("Ada", "ada@example.com", "1234567").validate().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("password"));
        assert_eq!(err.message, "Password must be at least 8 characters");
    }

    #[test]
    fn test_register_accepts_long_values() {
        let long_name = "N".repeat(101);
        let long_password = "p".repeat(300);
        assert!(register_body(&long_name, "ada@example.com", &long_password).is_valid());
    }

    #[test]
    fn test_login_validation() {
        let ok = LoginRequest {
            email: "ada@example.com".into(),
            password: "x".into(),
        };
        assert!(ok.is_valid());

        let empty = LoginRequest {
            email: "ada@example.com".into(),
            password: String::new(),
        };
        assert_eq!(empty.validate().unwrap_err().message, "Password is required");
    }
}
