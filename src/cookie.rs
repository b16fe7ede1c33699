//! Session Cookie Transport
//!
//! Moves the session token between server and browser in a single cookie.
//! The attribute set is fixed:
//!
//! ```text
//! auth-token=<token>; HttpOnly; Path=/; Max-Age=604800; SameSite=Lax[; Secure]
//! auth-token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax
//! ```
//!
//! `Secure` is only added in production, where the site is served over TLS.
//! Parsing the inbound `Cookie` header is deliberately forgiving: anything
//! that is not a clean `auth-token=<value>` pair reads as "no cookie".

use std::time::Duration;

use crate::token::DEFAULT_SESSION_TTL;

/// Name of the session cookie
pub const AUTH_COOKIE_NAME: &str = "auth-token";

/// Cookie attributes for the session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    /// Cookie name
    pub name: String,
    /// Lifetime advertised to the browser
    pub max_age: Duration,
    /// Emit the `Secure` attribute
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: AUTH_COOKIE_NAME.to_string(),
            max_age: DEFAULT_SESSION_TTL,
            secure: false,
        }
    }
}

impl CookieConfig {
    /// Session cookie for the given deployment mode
    pub fn for_production(production: bool) -> Self {
        Self {
            secure: production,
            ..Self::default()
        }
    }

    /// Override the advertised lifetime
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// `Set-Cookie` value carrying `token`
    pub fn encode(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
            self.name,
            token,
            self.max_age.as_secs()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value telling the browser to drop the cookie now
    pub fn encode_clear(&self) -> String {
        format!("{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax", self.name)
    }

    /// Extract the session token from a raw `Cookie` header
    ///
    /// Returns `None` when the header is absent or empty, when no pair
    /// carries exactly this cookie's name, or when its value is empty.
    pub fn decode(&self, header: Option<&str>) -> Option<String> {
        let header = header?;

        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim().trim_matches('"'))
            .filter(|value| !value.is_empty() && is_cookie_value(value))
            .map(str::to_string)
    }
}

/// RFC 6265 cookie-octet check: printable ASCII minus `"`, `,`, `;`, `\`, space
fn is_cookie_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_graphic() && !matches!(b, b'"' | b',' | b';' | b'\\'))
}
