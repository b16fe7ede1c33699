//! User Records and Storage
//!
//! The auth endpoints only need four things from persistence: look a user
//! up by id or by email, create one, and update a profile. [`UserStore`]
//! is that seam. Two implementations ship with the crate:
//!
//! - [`MemoryUserStore`] for tests and local experiments
//! - `PgUserStore` (feature `postgres`) in [`crate::database`]
//!
//! Email uniqueness belongs to the store. Handlers may pre-check, but a
//! concurrent registration can always slip between check and insert, so
//! the authoritative signal is [`StoreError::Conflict`] from `create` or
//! `update_profile`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Records and Projections
// ============================================================================

/// A stored user, including the password hash
///
/// Never serialized. Use [`PublicUser`] or [`UserProfile`] in responses.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct UserRecord {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity returned by the auth endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

impl From<&UserRecord> for PublicUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
        }
    }
}

/// Full own profile, minus the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Input to [`UserStore::create`]
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Input to [`UserStore::update_profile`]
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
}

/// Generate an opaque user identifier
pub fn new_user_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ============================================================================
// Store Trait
// ============================================================================

/// Store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated")]
    Conflict { constraint: Option<String> },

    /// The record to update does not exist
    #[error("Record not found")]
    NotFound,

    /// Anything else: connectivity, timeouts, corrupt rows
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Persistence operations the auth subsystem depends on
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Exact, case-sensitive match
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert a user. Fails with [`StoreError::Conflict`] if the email is taken.
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Replace name and email, bumping `updated_at`
    ///
    /// Fails with [`StoreError::NotFound`] for an unknown id and
    /// [`StoreError::Conflict`] if another user owns the email.
    async fn update_profile(
        &self,
        id: &str,
        update: ProfileUpdate,
    ) -> Result<UserRecord, StoreError>;

    /// Cheap reachability check for readiness probes
    async fn ping(&self) -> Result<(), StoreError>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// `HashMap`-backed store
///
/// The write lock spans check and insert, so uniqueness holds under
/// concurrent registrations just as a database constraint would.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write();

        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict {
                constraint: Some("users_email_key".to_string()),
            });
        }

        let now = Utc::now();
        let record = UserRecord {
            id: new_user_id(),
            name: Some(user.name),
            email: user.email,
            password_hash: user.password_hash,
            image: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id.clone(), record.clone());

        Ok(record)
    }

    async fn update_profile(
        &self,
        id: &str,
        update: ProfileUpdate,
    ) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write();

        if !users.contains_key(id) {
            return Err(StoreError::NotFound);
        }
        if users
            .values()
            .any(|u| u.id != id && u.email == update.email)
        {
            return Err(StoreError::Conflict {
                constraint: Some("users_email_key".to_string()),
            });
        }

        let record = users.get_mut(id).ok_or(StoreError::NotFound)?;
        record.name = Some(update.name);
        record.email = update.email;
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
