//! Application state and router assembly
//!
//! ```text
//! TraceLayer ─ security headers ─ body limit ─ timeout
//!   └─ route_guard
//!        ├─ /api/auth/*, /api/users, /api/health*   (JSON, Cache-Control: no-store)
//!        └─ pages: STATIC_DIR via ServeDir, or placeholder pages
//! ```
//!
//! # Example
//!
//! ```ignore
//! use latchkey::app::{build_router, AppState};
//!
//! let state = AppState::from_config(&config, Arc::new(store))?;
//! let app = build_router(state, &config);
//! axum::serve(listener, app).await?;
//! ```

use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::http::{StatusCode, Uri};
use axum::middleware;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tower_http::services::ServeDir;

use crate::auth;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::guard::{route_guard, RouteTable};
use crate::health::health_routes;
use crate::layers::HardenedRouter;
use crate::password::{CredentialHasher, PasswordError};
use crate::profile;
use crate::routes;
use crate::session::{Session, SessionResolver};
use crate::store::UserStore;
use crate::token::TokenError;
use crate::validation::escape_html;

// ============================================================================
// State
// ============================================================================

/// Shared, read-only handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub hasher: CredentialHasher,
    pub sessions: SessionResolver,
    pub routes: Arc<RouteTable>,
}

/// Failure turning configuration into state
#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, hasher: CredentialHasher, sessions: SessionResolver) -> Self {
        Self {
            store,
            hasher,
            sessions,
            routes: Arc::new(RouteTable::default()),
        }
    }

    /// Build hasher, codec and cookie policy from configuration
    pub fn from_config(config: &AppConfig, store: Arc<dyn UserStore>) -> Result<Self, StateError> {
        let sessions = SessionResolver::new(config.cookie_config(), config.token_codec()?);
        Ok(Self::new(store, config.hasher()?, sessions))
    }

    /// Replace the route classification table
    pub fn with_route_table(mut self, table: RouteTable) -> Self {
        self.routes = Arc::new(table);
        self
    }
}

impl FromRef<AppState> for SessionResolver {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<RouteTable> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.routes)
    }
}

impl FromRef<AppState> for Arc<dyn UserStore> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.store)
    }
}

// ============================================================================
// Router
// ============================================================================

/// JSON API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(routes::API_REGISTER, post(auth::register))
        .route(routes::API_LOGIN, post(auth::login))
        .route(routes::API_LOGOUT, post(auth::logout))
        .route(routes::API_ME, get(auth::me))
        .route(
            routes::API_USERS,
            get(profile::get_profile).patch(profile::update_profile),
        )
        .merge(health_routes())
        .with_no_store()
}

/// Assemble the full application
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new().merge(api_routes());

    let router = match &config.static_dir {
        Some(dir) => {
            tracing::info!(static_dir = %dir.display(), "Serving static front end");
            router.fallback_service(ServeDir::new(dir))
        }
        None => router
            .route(routes::HOME, get(placeholder_page))
            .route(routes::LOGIN, get(placeholder_page))
            .route(routes::REGISTER, get(placeholder_page))
            .route(routes::DASHBOARD, get(placeholder_page))
            .route(routes::PROFILE, get(placeholder_page))
            .fallback(not_found),
    };

    router
        .layer(middleware::from_fn_with_state(state.clone(), route_guard))
        .with_state(state)
        .with_hardening(config)
}

/// Minimal page showing who the guard let through
async fn placeholder_page(uri: Uri, State(state): State<AppState>, session: Session) -> Html<String> {
    let identity = match session.claim() {
        Some(claim) => match state.store.find_by_id(&claim.user_id).await {
            Ok(Some(user)) => format!(
                "Signed in as {}",
                escape_html(user.name.as_deref().unwrap_or(&user.email))
            ),
            _ => "Signed in".to_string(),
        },
        None => "Not signed in".to_string(),
    };

    Html(format!(
        "<!doctype html><html><head><title>{path}</title></head>\
         <body><h1>{path}</h1><p>{identity}</p></body></html>",
        path = escape_html(uri.path()),
        identity = identity,
    ))
}

async fn not_found(uri: Uri) -> Response {
    if uri.path().starts_with(routes::API_PREFIX) {
        return AppError::not_found("Not found").into_response();
    }
    (StatusCode::NOT_FOUND, Html("<!doctype html><h1>404</h1>")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::{generate_secret, SigningSecret};
    use crate::store::MemoryUserStore;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app_with(config: &AppConfig) -> Router {
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let sessions = SessionResolver::new(config.cookie_config(), config.token_codec().unwrap());
        let state = AppState::new(store, CredentialHasher::for_testing(), sessions);
        build_router(state, config)
    }

    fn config() -> AppConfig {
        let secret = SigningSecret::new(generate_secret(48)).unwrap();
        AppConfig::builder("postgres://localhost/test", secret).build()
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_public_placeholder_page() {
        let response = get(app_with(&config()), "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Not signed in"));
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_json_404() {
        let response = get(app_with(&config()), "/api/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_api_responses_not_cached() {
        let response = get(app_with(&config()), "/api/health").await;
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_static_dir_served_behind_guard() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::create_dir(dir.path().join("dashboard")).unwrap();
        std::fs::write(dir.path().join("dashboard").join("index.html"), "<h1>dash</h1>").unwrap();

        let secret = SigningSecret::new(generate_secret(48)).unwrap();
        let config = AppConfig::builder("postgres://localhost/test", secret)
            .static_dir(dir.path())
            .build();

        let home = get(app_with(&config), "/").await;
        assert_eq!(home.status(), StatusCode::OK);

        let dashboard = get(app_with(&config), "/dashboard/").await;
        assert_eq!(dashboard.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(dashboard.headers()[header::LOCATION], "/login?from=/dashboard/");
    }
}
