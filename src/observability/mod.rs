//! Logging and Auth Event Reporting
//!
//! Application code logs through plain `tracing` macros. This module owns
//! the subscriber setup and a small vocabulary of auth events so that
//! registrations, logins, logouts and guard redirects all carry the same
//! structured fields.
//!
//! # Usage
//!
//! ```ignore
//! use latchkey::observability::{init, LogConfig};
//!
//! init(&LogConfig::from_env())?;
//!
//! auth_event!(
//!     AuthEvent::LoginSucceeded,
//!     user_id = %user.id,
//!     "User logged in"
//! );
//! ```

mod config;
mod events;
mod providers;

pub use config::{LogConfig, LogConfigBuilder, LogFormat, DEFAULT_LOG_FILTER};
pub use events::{auth_event, AuthEvent, Severity};
pub use providers::init_tracing;

use thiserror::Error;
use tracing::info;

/// Install the global tracing subscriber
///
/// Call once at startup. A second call fails instead of replacing the
/// subscriber that is already installed.
pub fn init(config: &LogConfig) -> Result<(), ObservabilityError> {
    init_tracing(config)?;

    info!(
        log_format = ?config.log_format,
        log_filter = %config.log_filter,
        "Logging initialized"
    );

    Ok(())
}

/// Logging initialization errors
#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(String),
}
