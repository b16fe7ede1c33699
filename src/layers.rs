//! HTTP hardening layers for Axum routers
//!
//! Provides the `HardenedRouter` trait that wraps a router with the
//! request limits, response headers and tracing every deployment gets.

use axum::http::{header, HeaderValue, StatusCode};
use axum::Router;
use tower_http::{
    limit::RequestBodyLimitLayer, set_header::SetResponseHeaderLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;

/// Extension trait for applying hardening layers to an Axum Router.
///
/// # Example
///
/// ```ignore
/// use latchkey::layers::HardenedRouter;
///
/// let app = Router::new()
///     .route("/", get(handler))
///     .with_hardening(&config);
/// ```
pub trait HardenedRouter {
    /// Apply all layers. Outermost first:
    /// 1. TraceLayer
    /// 2. Security headers
    /// 3. Request body limit
    /// 4. Timeout
    fn with_hardening(self, config: &AppConfig) -> Self;

    /// Mark every response as uncacheable (API routes)
    fn with_no_store(self) -> Self;
}

impl<S> HardenedRouter for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_hardening(self, config: &AppConfig) -> Self {
        let mut router = self
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.request_timeout,
            ))
            .layer(RequestBodyLimitLayer::new(config.max_request_size))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ));

        // Only meaningful once the site is behind TLS
        if config.production {
            router = router.layer(SetResponseHeaderLayer::overriding(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ));
        }

        router.layer(TraceLayer::new_for_http())
    }

    fn with_no_store(self) -> Self {
        self.layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::generate_secret;
    use crate::secret::SigningSecret;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use tower::ServiceExt;

    fn config(production: bool) -> AppConfig {
        let secret = SigningSecret::new(generate_secret(48)).unwrap();
        AppConfig::builder("postgres://localhost/test", secret)
            .production(production)
            .max_request_size(16)
            .build()
    }

    #[tokio::test]
    async fn test_security_headers() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .with_hardening(&config(false));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::REFERRER_POLICY], "strict-origin-when-cross-origin");
        assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
        assert!(headers.get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_hsts_in_production() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .with_hardening(&config(true));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[tokio::test]
    async fn test_no_store() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .with_no_store();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let app = Router::new()
            .route("/", post(|body: String| async move { body }))
            .with_hardening(&config(false));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_LENGTH, "64")
                    .body(Body::from("x".repeat(64)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
