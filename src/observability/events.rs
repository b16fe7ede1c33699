//! Auth Event Logging
//!
//! Every security-relevant outcome is logged through [`auth_event!`] so
//! that log aggregation can filter on `auth_event`, `category` and
//! `severity` without parsing messages.
//!
//! Failure events never carry the reason a session was rejected or
//! whether an email exists. Those go to debug logs only.

use std::fmt;

/// Auth subsystem events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// New account created
    UserRegistered,
    /// Registration refused because the email is taken
    RegistrationConflict,
    /// Credentials accepted
    LoginSucceeded,
    /// Credentials rejected
    LoginFailed,
    /// Clearing cookie issued
    Logout,
    /// Session token issued and attached
    SessionIssued,
    /// Session cookie named a user the store no longer has
    SessionOrphaned,
    /// Anonymous request redirected away from a protected page
    AccessDenied,
    /// Profile name or email changed
    ProfileUpdated,
    /// Server started listening
    SystemStartup,
    /// User store connected and migrated
    DatabaseConnected,
}

impl AuthEvent {
    /// Grouping for filtering
    pub fn category(&self) -> &'static str {
        match self {
            Self::LoginSucceeded | Self::LoginFailed | Self::Logout | Self::SessionIssued => {
                "authentication"
            }
            Self::AccessDenied | Self::SessionOrphaned => "authorization",
            Self::UserRegistered | Self::RegistrationConflict | Self::ProfileUpdated => {
                "user_management"
            }
            Self::SystemStartup | Self::DatabaseConnected => "system",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::LoginFailed | Self::SessionOrphaned => Severity::High,
            Self::UserRegistered
            | Self::RegistrationConflict
            | Self::LoginSucceeded
            | Self::Logout
            | Self::ProfileUpdated
            | Self::SystemStartup
            | Self::DatabaseConnected => Severity::Medium,
            Self::SessionIssued | Self::AccessDenied => Severity::Low,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UserRegistered => "user_registered",
            Self::RegistrationConflict => "registration_conflict",
            Self::LoginSucceeded => "login_succeeded",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::SessionIssued => "session_issued",
            Self::SessionOrphaned => "session_orphaned",
            Self::AccessDenied => "access_denied",
            Self::ProfileUpdated => "profile_updated",
            Self::SystemStartup => "system_startup",
            Self::DatabaseConnected => "database_connected",
        }
    }
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event severity, mapped onto tracing levels by [`auth_event!`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// debug
    Low,
    /// info
    Medium,
    /// warn
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Log an [`AuthEvent`] with structured fields
///
/// ```ignore
/// auth_event!(
///     AuthEvent::LoginFailed,
///     "Login rejected"
/// );
///
/// auth_event!(
///     AuthEvent::UserRegistered,
///     user_id = %user.id,
///     "User registered"
/// );
/// ```
#[macro_export]
macro_rules! auth_event {
    ($event:expr, $($field:tt)*) => {{
        let event: $crate::observability::AuthEvent = $event;
        let category = event.category();
        let event_name = event.name();

        match event.severity() {
            $crate::observability::Severity::High => {
                ::tracing::warn!(
                    auth_event = event_name,
                    category = category,
                    severity = "high",
                    $($field)*
                );
            }
            $crate::observability::Severity::Medium => {
                ::tracing::info!(
                    auth_event = event_name,
                    category = category,
                    severity = "medium",
                    $($field)*
                );
            }
            $crate::observability::Severity::Low => {
                ::tracing::debug!(
                    auth_event = event_name,
                    category = category,
                    severity = "low",
                    $($field)*
                );
            }
        }
    }};
}

pub use auth_event;
