//! Application configuration
//!
//! Everything the server needs is read once at startup into an
//! [`AppConfig`]. Required values that are missing or invalid are a
//! [`ConfigError`], and the binary exits on it; there is no degraded mode
//! in which the server starts without a store or a signing secret.
//!
//! # Environment Variables
//!
//! | Variable | Default | Notes |
//! |---|---|---|
//! | `DATABASE_URL` | required | `postgres://` or `postgresql://` |
//! | `JWT_SECRET` | required | at least 32 characters |
//! | `APP_ENV` / `RUST_ENV` | `development` | `production` or `prod` enables `Secure` cookies |
//! | `BIND_ADDR` | `0.0.0.0:3000` | |
//! | `SESSION_TTL` | `7d` | token and cookie lifetime, at least `1s` |
//! | `PASSWORD_HASH_COST` | `3` | Argon2 time cost, at least 1 |
//! | `REQUEST_TIMEOUT` | `30s` | |
//! | `MAX_REQUEST_SIZE` | `1MB` | |
//! | `STATIC_DIR` | unset | built front end served behind the route guard |
//! | `DB_MAX_CONNECTIONS` | `10` | |
//!
//! # Example
//!
//! ```ignore
//! use latchkey::config::AppConfig;
//!
//! // Load from environment variables
//! let config = AppConfig::from_env()?;
//!
//! // Or build programmatically
//! let config = AppConfig::builder("postgres://localhost/app", secret)
//!     .production(true)
//!     .session_ttl(Duration::from_secs(3600))
//!     .build();
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cookie::CookieConfig;
use crate::parse::{parse_duration, parse_size};
use crate::password::{CredentialHasher, PasswordError, DEFAULT_TIME_COST};
use crate::secret::{SecretError, SigningSecret};
use crate::token::{TokenCodec, TokenError, DEFAULT_SESSION_TTL};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_REQUEST_SIZE: usize = 1024 * 1024;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("DATABASE_URL must be a postgres:// or postgresql:// URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Session token signing key
    pub secret: SigningSecret,

    /// Production mode: cookies carry `Secure`
    pub production: bool,

    /// Listen address
    pub bind_addr: SocketAddr,

    /// Token validity and cookie `Max-Age`
    pub session_ttl: Duration,

    /// Argon2 time cost
    pub password_hash_cost: u32,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Maximum request body size in bytes
    pub max_request_size: usize,

    /// Directory of static front-end assets
    pub static_dir: Option<PathBuf>,

    /// Connection pool size
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        if !(database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")) {
            return Err(ConfigError::InvalidDatabaseUrl);
        }

        let secret = SigningSecret::new(get("JWT_SECRET").unwrap_or_default())?;

        let production = get("APP_ENV")
            .or_else(|| get("RUST_ENV"))
            .map(|env| is_production(&env))
            .unwrap_or(false);

        let bind_addr = match get("BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value,
                reason: "expected host:port",
            })?,
            None => default_bind_addr(),
        };

        let session_ttl = duration_var(get("SESSION_TTL"), "SESSION_TTL", DEFAULT_SESSION_TTL)?;
        if session_ttl < Duration::from_secs(1) {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL",
                value: format!("{}ms", session_ttl.as_millis()),
                reason: "must be at least 1s",
            });
        }

        let password_hash_cost = match get("PASSWORD_HASH_COST") {
            Some(value) => match value.parse::<u32>() {
                Ok(cost) if cost >= 1 => cost,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "PASSWORD_HASH_COST",
                        value,
                        reason: "expected an integer >= 1",
                    })
                }
            },
            None => DEFAULT_TIME_COST,
        };

        let request_timeout =
            duration_var(get("REQUEST_TIMEOUT"), "REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT)?;

        let max_request_size = match get("MAX_REQUEST_SIZE") {
            Some(value) => parse_size(&value).ok_or(ConfigError::Invalid {
                key: "MAX_REQUEST_SIZE",
                value,
                reason: "expected a size like 512KB or 1MB",
            })?,
            None => DEFAULT_MAX_REQUEST_SIZE,
        };

        let static_dir = get("STATIC_DIR").map(PathBuf::from);

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DB_MAX_CONNECTIONS",
                        value,
                        reason: "expected an integer >= 1",
                    })
                }
            },
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            secret,
            production,
            bind_addr,
            session_ttl,
            password_hash_cost,
            request_timeout,
            max_request_size,
            static_dir,
            db_max_connections,
        })
    }

    /// Create a builder with the two required values
    pub fn builder(database_url: impl Into<String>, secret: SigningSecret) -> AppConfigBuilder {
        AppConfigBuilder::new(database_url, secret)
    }

    /// Session cookie attributes for this deployment
    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig::for_production(self.production).with_max_age(self.session_ttl)
    }

    /// Token codec bound to the configured secret and lifetime
    pub fn token_codec(&self) -> Result<TokenCodec, TokenError> {
        TokenCodec::new(&self.secret, self.session_ttl)
    }

    /// Password hasher with the configured cost
    pub fn hasher(&self) -> Result<CredentialHasher, PasswordError> {
        CredentialHasher::new(self.password_hash_cost)
    }

    /// Pool settings for the configured database
    #[cfg(feature = "postgres")]
    pub fn database_config(&self) -> crate::database::DatabaseConfig {
        crate::database::DatabaseConfig::builder(self.database_url.clone())
            .max_connections(self.db_max_connections)
            .build()
    }
}

fn is_production(env: &str) -> bool {
    matches!(env.trim().to_lowercase().as_str(), "production" | "prod")
}

fn default_bind_addr() -> SocketAddr {
    DEFAULT_BIND_ADDR
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000)))
}

fn duration_var(
    value: Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => parse_duration(&value).ok_or(ConfigError::Invalid {
            key,
            value,
            reason: "expected a duration like 30s, 15m or 7d",
        }),
        None => Ok(default),
    }
}

/// Builder for AppConfig
#[derive(Debug, Clone)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn new(database_url: impl Into<String>, secret: SigningSecret) -> Self {
        Self {
            config: AppConfig {
                database_url: database_url.into(),
                secret,
                production: false,
                bind_addr: default_bind_addr(),
                session_ttl: DEFAULT_SESSION_TTL,
                password_hash_cost: DEFAULT_TIME_COST,
                request_timeout: DEFAULT_REQUEST_TIMEOUT,
                max_request_size: DEFAULT_MAX_REQUEST_SIZE,
                static_dir: None,
                db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            },
        }
    }

    pub fn production(mut self, production: bool) -> Self {
        self.config.production = production;
        self
    }

    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.config.session_ttl = ttl;
        self
    }

    pub fn password_hash_cost(mut self, cost: u32) -> Self {
        self.config.password_hash_cost = cost;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn max_request_size(mut self, size: usize) -> Self {
        self.config.max_request_size = size;
        self
    }

    pub fn static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.static_dir = Some(dir.into());
        self
    }

    pub fn db_max_connections(mut self, n: u32) -> Self {
        self.config.db_max_connections = n;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
