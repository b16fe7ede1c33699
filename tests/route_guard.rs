//! Route guard behavior through the assembled router

mod common;

use axum::http::{header, StatusCode};

use common::{body_json, TestApp};

#[tokio::test]
async fn test_dashboard_anonymous_redirects_to_login() {
    let app = TestApp::new();

    let response = app.get("/dashboard", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/login?from=/dashboard");
}

#[tokio::test]
async fn test_invalid_cookie_is_anonymous() {
    let app = TestApp::new();

    let response = app.get("/profile", Some("auth-token=not.a.token")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/login?from=/profile");
}

#[tokio::test]
async fn test_dashboard_with_session_passes() {
    let app = TestApp::new();
    let cookie = app.register("Ada", "ada@example.com", "12345678").await;

    let response = app.get("/dashboard", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_session_redirects_to_dashboard() {
    let app = TestApp::new();
    let cookie = app.register("Ada", "ada@example.com", "12345678").await;

    let response = app.get("/login", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/dashboard");

    let response = app.get("/register", Some(&cookie)).await;
    assert_eq!(response.headers()[header::LOCATION], "/dashboard");
}

#[tokio::test]
async fn test_login_anonymous_passes() {
    let app = TestApp::new();
    assert_eq!(app.get("/login", None).await.status(), StatusCode::OK);
    assert_eq!(app.get("/", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_is_never_redirected() {
    let app = TestApp::new();
    let cookie = app.register("Ada", "ada@example.com", "12345678").await;

    let anonymous = app.get("/api/users", None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert!(anonymous.headers().get(header::LOCATION).is_none());

    let authed = app.get("/api/users", Some(&cookie)).await;
    assert_eq!(authed.status(), StatusCode::OK);
    assert_eq!(body_json(authed).await["email"], "ada@example.com");
}

#[tokio::test]
async fn test_static_looking_paths_skip_guard() {
    let app = TestApp::new();

    let response = app.get("/dashboard/report.pdf", None).await;
    assert_ne!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_hardening_headers_on_pages() {
    let app = TestApp::new();

    let response = app.get("/", None).await;
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert!(response.headers().get("strict-transport-security").is_none());
}
