//! Profile Endpoints
//!
//! `GET /api/users` returns the caller's own [`UserProfile`];
//! `PATCH /api/users` replaces its name and email.
//!
//! Changing the email does not reissue the session token, so the claim
//! keeps the old address until the next login. Handlers read identity from
//! the store, never from the claim's email.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::{current_user, MIN_NAME_LENGTH};
use crate::error::{AppError, Result};
use crate::observability::{auth_event, AuthEvent};
use crate::session::Authenticated;
use crate::store::{ProfileUpdate, StoreError, UserProfile};
use crate::validation::{validate_email, validate_min_length, Validate, ValidatedJson, ValidationError};

/// Conflict message for profile updates
pub const EMAIL_TAKEN_MESSAGE: &str = "Email already exists";

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_min_length(&self.name, MIN_NAME_LENGTH, "name")?;
        validate_email(&self.email)?;
        Ok(())
    }
}

/// `GET /api/users`
pub async fn get_profile(
    State(state): State<AppState>,
    Authenticated(claim): Authenticated,
) -> Result<Json<UserProfile>> {
    let user = current_user(&state, &claim).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// `PATCH /api/users`
pub async fn update_profile(
    State(state): State<AppState>,
    Authenticated(claim): Authenticated,
    ValidatedJson(input): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    let user = current_user(&state, &claim).await?;

    if input.email != user.email {
        if let Some(owner) = state.store.find_by_email(&input.email).await? {
            if owner.id != user.id {
                return Err(AppError::conflict(EMAIL_TAKEN_MESSAGE));
            }
        }
    }

    let updated = state
        .store
        .update_profile(
            &user.id,
            ProfileUpdate {
                name: input.name,
                email: input.email,
            },
        )
        .await
        .map_err(|e| match e {
            StoreError::Conflict { .. } => AppError::conflict(EMAIL_TAKEN_MESSAGE),
            // Deleted between lookup and update
            StoreError::NotFound => AppError::authentication_required(),
            other => other.into(),
        })?;

    auth_event!(
        AuthEvent::ProfileUpdated,
        user_id = %updated.id,
        email_changed = updated.email != user.email,
        "Profile updated"
    );

    Ok(Json(UserProfile::from(&updated)))
}
