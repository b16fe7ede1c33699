//! End-to-end tests for the auth and profile APIs over an in-memory store

mod common;

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use common::{body_json, session_cookie, set_cookie, TestApp};
use latchkey::{generate_secret, AppConfig, SessionClaim, SigningSecret, TokenCodec, UserStore};

#[tokio::test]
async fn test_register_sets_cookie_and_hides_hash() {
    let app = TestApp::new();

    let response = app
        .json(
            Method::POST,
            "/api/auth/register",
            json!({"name": "Ada", "email": "ada@example.com", "password": "12345678"}),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("auth-token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));

    let body = body_json(response).await;
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["name"], "Ada");
    assert!(body["id"].is_string());
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());

    let stored = app.store.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert!(stored.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_register_existing_email_conflicts() {
    let app = TestApp::new();
    app.register("Ada", "ada@example.com", "12345678").await;

    let response = app
        .json(
            Method::POST,
            "/api/auth/register",
            json!({"name": "Other", "email": "ada@example.com", "password": "abcdefgh"}),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        body_json(response).await["error"],
        "User with this email already exists"
    );
    assert_eq!(app.store.len(), 1);
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = TestApp::new();

    let response = app
        .json(
            Method::POST,
            "/api/auth/register",
            json!({"name": "Ada", "email": "ada@example.com", "password": "1234567"}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["field"], "password");

    let response = app
        .json(Method::POST, "/api/auth/register", json!({"email": "x"}), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid input data");

    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_login_errors_do_not_reveal_accounts() {
    let app = TestApp::new();
    app.register("Ada", "ada@example.com", "12345678").await;

    let wrong_password = app
        .json(
            Method::POST,
            "/api/auth/login",
            json!({"email": "ada@example.com", "password": "wrong-password"}),
            None,
        )
        .await;
    let unknown_email = app
        .json(
            Method::POST,
            "/api/auth/login",
            json!({"email": "nobody@example.com", "password": "wrong-password"}),
            None,
        )
        .await;

    assert_eq!(wrong_password.status(), StatusCode::BAD_REQUEST);
    assert_eq!(unknown_email.status(), StatusCode::BAD_REQUEST);
    assert!(wrong_password.headers().get(header::SET_COOKIE).is_none());

    let a = body_json(wrong_password).await;
    let b = body_json(unknown_email).await;
    assert_eq!(a, b);
    assert_eq!(a["error"], "Invalid email or password");
}

#[tokio::test]
async fn test_login_then_me() {
    let app = TestApp::new();
    app.register("Ada", "ada@example.com", "12345678").await;

    let response = app
        .json(
            Method::POST,
            "/api/auth/login",
            json!({"email": "ada@example.com", "password": "12345678"}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).unwrap();

    let me = app.get("/api/auth/me", Some(&cookie)).await;
    assert_eq!(me.status(), StatusCode::OK);
    let body = body_json(me).await;
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_me_without_valid_session() {
    let app = TestApp::new();

    let response = app.get("/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Authentication required");

    let response = app.get("/api/auth/me", Some("auth-token=garbage")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_with_token_from_other_secret() {
    let app = TestApp::new();
    let cookie = app.register("Ada", "ada@example.com", "12345678").await;
    let user = app.store.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert_eq!(app.get("/api/auth/me", Some(&cookie)).await.status(), StatusCode::OK);

    let other = SigningSecret::new(generate_secret(48)).unwrap();
    let codec = TokenCodec::new(&other, app.config.session_ttl).unwrap();
    let forged = codec.issue(&SessionClaim::new(user.id, user.email)).unwrap();

    let response = app
        .get("/api/auth/me", Some(&format!("auth-token={}", forged)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_for_missing_user() {
    let app = TestApp::new();
    let codec = app.config.token_codec().unwrap();
    let token = codec
        .issue(&SessionClaim::new("ghost", "ghost@example.com"))
        .unwrap();

    let response = app
        .get("/api/auth/me", Some(&format!("auth-token={}", token)))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session() {
    let app = TestApp::new();

    let response = app.json(Method::POST, "/api/auth/logout", json!({}), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        set_cookie(&response),
        "auth-token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax"
    );
    assert_eq!(body_json(response).await["message"], "Logged out successfully");
}

#[tokio::test]
async fn test_production_cookie_is_secure() {
    let secret = SigningSecret::new(generate_secret(48)).unwrap();
    let config = AppConfig::builder("postgres://localhost/test", secret)
        .production(true)
        .build();
    let app = TestApp::with_config(config);

    let response = app
        .json(
            Method::POST,
            "/api/auth/register",
            json!({"name": "Ada", "email": "ada@example.com", "password": "12345678"}),
            None,
        )
        .await;
    assert!(set_cookie(&response).ends_with("; Secure"));
}

#[tokio::test]
async fn test_profile_roundtrip() {
    let app = TestApp::new();
    let cookie = app.register("Ada", "ada@example.com", "12345678").await;

    let response = app.get("/api/users", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["name"], "Ada");
    assert!(profile["createdAt"].is_string());
    assert!(profile.get("passwordHash").is_none());

    let response = app
        .json(
            Method::PATCH,
            "/api/users",
            json!({"name": "Ada Lovelace", "email": "lovelace@example.com"}),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["name"], "Ada Lovelace");
    assert_eq!(updated["email"], "lovelace@example.com");

    // The old claim still resolves: identity is keyed by id
    let me = body_json(app.get("/api/auth/me", Some(&cookie)).await).await;
    assert_eq!(me["email"], "lovelace@example.com");
}

#[tokio::test]
async fn test_profile_email_taken() {
    let app = TestApp::new();
    app.register("Bob", "bob@example.com", "12345678").await;
    let cookie = app.register("Ada", "ada@example.com", "12345678").await;

    let response = app
        .json(
            Method::PATCH,
            "/api/users",
            json!({"name": "Ada", "email": "bob@example.com"}),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Email already exists");
}

#[tokio::test]
async fn test_profile_keeping_own_email() {
    let app = TestApp::new();
    let cookie = app.register("Ada", "ada@example.com", "12345678").await;

    let response = app
        .json(
            Method::PATCH,
            "/api/users",
            json!({"name": "Ada L", "email": "ada@example.com"}),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_profile_requires_session() {
    let app = TestApp::new();

    assert_eq!(app.get("/api/users", None).await.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .json(
            Method::PATCH,
            "/api/users",
            json!({"name": "Ada", "email": "ada@example.com"}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_long_name_and_password_accepted() {
    let app = TestApp::new();
    let name = "N".repeat(101);
    let password = "p".repeat(300);

    let cookie = app.register(&name, "ada@example.com", &password).await;

    let response = app
        .json(
            Method::POST,
            "/api/auth/login",
            json!({"email": "ada@example.com", "password": password}),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .json(
            Method::PATCH,
            "/api/users",
            json!({"name": "M".repeat(150), "email": "ada@example.com"}),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
