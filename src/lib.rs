//! # Latchkey
//!
//! Cookie-session authentication for Axum web applications.
//!
//! Users register and log in with an email and password; the server hashes
//! the password with Argon2id, signs a short session token, and hands it to
//! the browser in an `HttpOnly` cookie. Every later request is resolved back
//! to a user (or to no one) from that cookie alone.
//!
//! ## Features
//!
//! - **Credential hashing**: Argon2id with a configurable time cost
//! - **Session tokens**: HS256, algorithm pinned, expiry always checked
//! - **Cookie transport**: `HttpOnly`, `SameSite=Lax`, `Secure` in production
//! - **Route guard**: redirects anonymous visitors away from protected pages
//!   and signed-in users away from login and register
//! - **Auth and profile APIs**: register, login, logout, who-am-i, profile
//! - **User store**: PostgreSQL via sqlx, or in memory for tests
//! - **Hardening**: timeouts, body limits, security headers, structured logs
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use latchkey::{build_router, create_pool, run_migrations, AppConfig, AppState, PgUserStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let pool = create_pool(&config.database_config()).await?;
//!     run_migrations(&pool).await?;
//!
//!     let state = AppState::from_config(&config, Arc::new(PgUserStore::new(pool)))?;
//!     let app = build_router(state, &config);
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod auth;
pub mod config;
pub mod cookie;
#[cfg(feature = "postgres")]
pub mod database;
pub mod error;
pub mod guard;
pub mod health;
pub mod layers;
pub mod observability;
mod parse;
pub mod password;
pub mod profile;
pub mod routes;
pub mod secret;
pub mod session;
pub mod store;
pub mod token;
pub mod validation;

// Re-exports
pub use app::{build_router, AppState, StateError};
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use cookie::{CookieConfig, AUTH_COOKIE_NAME};
pub use error::{AppError, ErrorKind};
pub use guard::{route_guard, GuardDecision, RouteClass, RouteTable};
pub use layers::HardenedRouter;
pub use parse::{parse_duration, parse_size};
pub use password::{CredentialHasher, PasswordError};
pub use secret::{generate_secret, SecretError, SigningSecret};
pub use session::{Authenticated, Session, SessionResolver};
pub use store::{MemoryUserStore, PublicUser, StoreError, UserProfile, UserRecord, UserStore};
pub use token::{SessionClaim, TokenCodec, TokenError};

#[cfg(feature = "postgres")]
pub use database::{
    create_pool, run_migrations, DatabaseConfig, DatabaseConfigBuilder, DatabaseError, PgUserStore,
    SslMode,
};
