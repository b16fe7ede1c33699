//! Session Resolution
//!
//! Turns an inbound `Cookie` header into either a verified
//! [`SessionClaim`] or [`Session::Anonymous`]. The resolver is a pure
//! function of the header and the signing secret: no store access and no
//! shared mutable state, so it is cheap enough to run on every request.
//!
//! Callers cannot tell "no cookie" from "tampered cookie" from "expired
//! token". All of them are simply anonymous.
//!
//! # Usage in handlers
//!
//! ```ignore
//! use latchkey::session::{Session, Authenticated};
//!
//! // Optional identity
//! async fn page(session: Session) -> String {
//!     match session.claim() {
//!         Some(claim) => format!("hello {}", claim.email),
//!         None => "hello stranger".into(),
//!     }
//! }
//!
//! // Required identity, 401 otherwise
//! async fn private(Authenticated(claim): Authenticated) -> String {
//!     claim.user_id
//! }
//! ```

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::cookie::CookieConfig;
use crate::error::AppError;
use crate::token::{SessionClaim, TokenCodec};

/// Outcome of resolving a request's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// A valid, unexpired token was presented
    Authenticated(SessionClaim),
    /// Anything else
    Anonymous,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn claim(&self) -> Option<&SessionClaim> {
        match self {
            Self::Authenticated(claim) => Some(claim),
            Self::Anonymous => None,
        }
    }

    pub fn into_claim(self) -> Option<SessionClaim> {
        match self {
            Self::Authenticated(claim) => Some(claim),
            Self::Anonymous => None,
        }
    }
}

/// Cookie decoding plus token verification
#[derive(Debug, Clone)]
pub struct SessionResolver {
    cookies: CookieConfig,
    codec: TokenCodec,
}

impl SessionResolver {
    pub fn new(cookies: CookieConfig, codec: TokenCodec) -> Self {
        Self { cookies, codec }
    }

    /// Resolve from a raw `Cookie` header value
    pub fn resolve(&self, cookie_header: Option<&str>) -> Session {
        self.cookies
            .decode(cookie_header)
            .and_then(|token| self.codec.verify(&token))
            .map(Session::Authenticated)
            .unwrap_or(Session::Anonymous)
    }

    /// Resolve from request headers
    ///
    /// Multiple `Cookie` headers (HTTP/2 splits them) are joined first.
    /// A header that is not valid UTF-8 is ignored.
    pub fn resolve_headers(&self, headers: &HeaderMap) -> Session {
        let joined = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");

        if joined.is_empty() {
            Session::Anonymous
        } else {
            self.resolve(Some(&joined))
        }
    }

    pub fn cookies(&self) -> &CookieConfig {
        &self.cookies
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

impl<S> FromRequestParts<S> for Session
where
    SessionResolver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }

        let resolver = SessionResolver::from_ref(state);
        Ok(resolver.resolve_headers(&parts.headers))
    }
}

/// Extractor that requires an authenticated session
///
/// Rejects with 401 "Authentication required".
#[derive(Debug, Clone)]
pub struct Authenticated(pub SessionClaim);

impl<S> FromRequestParts<S> for Authenticated
where
    SessionResolver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        session
            .into_claim()
            .map(Authenticated)
            .ok_or_else(AppError::authentication_required)
    }
}
