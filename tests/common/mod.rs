//! Shared helpers for router-level tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use latchkey::{
    build_router, generate_secret, AppConfig, AppState, CredentialHasher, MemoryUserStore,
    SessionResolver, SigningSecret, UserStore,
};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryUserStore>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryUserStore::new());
        let handler_store: Arc<dyn UserStore> = store.clone();
        Self::with_stores(config, store, handler_store)
    }

    /// Handlers see `handler_store`; `store` is the backing data for assertions
    pub fn with_stores(
        config: AppConfig,
        store: Arc<MemoryUserStore>,
        handler_store: Arc<dyn UserStore>,
    ) -> Self {
        let sessions = SessionResolver::new(config.cookie_config(), config.token_codec().unwrap());
        let state = AppState::new(handler_store, CredentialHasher::for_testing(), sessions);

        Self {
            router: build_router(state, &config),
            store,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Register a user and return the `name=value` cookie pair
    pub async fn register(&self, name: &str, email: &str, password: &str) -> String {
        let response = self
            .json(
                Method::POST,
                "/api/auth/register",
                serde_json::json!({"name": name, "email": email, "password": password}),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        session_cookie(&response).expect("register sets a cookie")
    }
}

pub fn test_config() -> AppConfig {
    let secret = SigningSecret::new(generate_secret(48)).unwrap();
    AppConfig::builder("postgres://localhost/test", secret).build()
}

/// The `name=value` part of the response's Set-Cookie header
pub fn session_cookie(response: &Response) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(str::to_string)
}

pub fn set_cookie(response: &Response) -> String {
    response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
