//! Route Guard
//!
//! A middleware that runs before page rendering and decides, per request,
//! whether to pass it through or redirect it. The decision depends only on
//! the path and the session cookie; no store access happens here.
//!
//! ```text
//!                  ┌────────────┬───────────────────────────┐
//!                  │ anonymous  │ authenticated             │
//! ┌────────────────┼────────────┼───────────────────────────┤
//! │ protected      │ → /login?from=<path>                   │
//! │                │            │ pass                      │
//! │ auth-only      │ pass       │ → /dashboard              │
//! │ public         │ pass       │ pass                      │
//! └────────────────┴────────────┴───────────────────────────┘
//! ```
//!
//! Classification is plain prefix matching, so `/dashboard/settings` and
//! `/profiles` are both protected. API routes and static assets are always
//! public; API handlers enforce authentication themselves.
//!
//! Redirects use 307 so the method and body survive.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::observability::{auth_event, AuthEvent};
use crate::routes;
use crate::session::{Session, SessionResolver};

/// Prefixes that bypass the guard entirely
const PUBLIC_PREFIXES: &[&str] = &[routes::API_PREFIX, "/_next/static", "/_next/image", "/favicon.ico"];

/// How the guard treats a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a session
    Protected,
    /// Only for visitors without a session
    AuthOnly,
    /// Never redirected
    Public,
}

/// What the guard does with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Static classification table
#[derive(Debug, Clone)]
pub struct RouteTable {
    protected: Vec<String>,
    auth_only: Vec<String>,
    login_path: String,
    landing_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            protected: vec![routes::DASHBOARD.to_string(), routes::PROFILE.to_string()],
            auth_only: vec![routes::LOGIN.to_string(), routes::REGISTER.to_string()],
            login_path: routes::LOGIN.to_string(),
            landing_path: routes::DASHBOARD.to_string(),
        }
    }
}

impl RouteTable {
    /// Table with custom prefixes; login and landing paths keep their defaults
    pub fn new<P, A>(protected: P, auth_only: A) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            protected: protected.into_iter().map(Into::into).collect(),
            auth_only: auth_only.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    /// Classify a request path
    pub fn classify(&self, path: &str) -> RouteClass {
        if is_excluded(path) {
            return RouteClass::Public;
        }
        if self.protected.iter().any(|p| path.starts_with(p.as_str())) {
            return RouteClass::Protected;
        }
        if self.auth_only.iter().any(|p| path.starts_with(p.as_str())) {
            return RouteClass::AuthOnly;
        }
        RouteClass::Public
    }

    /// Decide what to do with a request for `path`
    pub fn decide(&self, path: &str, session: &Session) -> GuardDecision {
        match (self.classify(path), session.is_authenticated()) {
            (RouteClass::Protected, false) => GuardDecision::Redirect(self.login_redirect(path)),
            (RouteClass::AuthOnly, true) => GuardDecision::Redirect(self.landing_path.clone()),
            _ => GuardDecision::Allow,
        }
    }

    /// `/login?from=<path>`, keeping slashes readable
    fn login_redirect(&self, from: &str) -> String {
        let encoded = urlencoding::encode(from).replace("%2F", "/");
        format!("{}?from={}", self.login_path, encoded)
    }
}

/// API routes, framework assets and anything that looks like a file
fn is_excluded(path: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) || path.contains('.')
}

/// Axum middleware applying a [`RouteTable`]
///
/// Public paths skip session resolution. For the rest, the resolved
/// [`Session`] is stored in request extensions so handlers extracting it
/// do not verify the token twice.
///
/// ```ignore
/// let app = Router::new()
///     .route("/dashboard", get(dashboard))
///     .layer(middleware::from_fn_with_state(state.clone(), route_guard))
///     .with_state(state);
/// ```
pub async fn route_guard(
    State(table): State<Arc<RouteTable>>,
    State(resolver): State<SessionResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    if table.classify(&path) == RouteClass::Public {
        return next.run(request).await;
    }

    let session = resolver.resolve_headers(request.headers());
    match table.decide(&path, &session) {
        GuardDecision::Allow => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GuardDecision::Redirect(location) => {
            if !session.is_authenticated() {
                auth_event!(AuthEvent::AccessDenied, path = %path, "Redirecting to login");
            }
            Redirect::temporary(&location).into_response()
        }
    }
}
