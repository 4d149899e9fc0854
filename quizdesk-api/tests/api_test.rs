/// Router-level tests that need no database
///
/// Every request here is answered before a handler reaches PostgreSQL:
/// authentication and body validation run first.

mod common;

use axum::http::{header, Method, StatusCode};
use chrono::Duration;
use common::{lazy_app, send, TEST_JWT_SECRET};
use quizdesk_shared::auth::jwt::{create_token, Claims, TokenType};
use serde_json::json;
use uuid::Uuid;

fn token(token_type: TokenType) -> String {
    create_token(&Claims::new(Uuid::new_v4(), token_type), TEST_JWT_SECRET).unwrap()
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = lazy_app();
    let id = Uuid::new_v4();

    let routes = [
        (Method::GET, "/v1/auth/me".to_string()),
        (Method::GET, "/v1/users".to_string()),
        (Method::GET, format!("/v1/users/{}/rating", id)),
        (Method::POST, "/v1/companies".to_string()),
        (Method::GET, format!("/v1/companies/{}/members", id)),
        (Method::POST, format!("/v1/companies/{}/invites/{}", id, id)),
        (Method::POST, format!("/v1/actions/{}/accept-invite", id)),
        (Method::DELETE, format!("/v1/quizzes/{}/questions/{}", id, id)),
        (Method::POST, format!("/v1/quizzes/{}/attempts", id)),
    ];

    for (method, uri) in routes {
        let (status, body) = send(&app, method.clone(), &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_invalid_tokens_rejected() {
    let app = lazy_app();

    let (status, _) = send(&app, Method::GET, "/v1/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Refresh tokens cannot be used as access tokens
    let refresh = token(TokenType::Refresh);
    let (status, _) = send(&app, Method::GET, "/v1/auth/me", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = create_token(
        &Claims::with_expiration(Uuid::new_v4(), TokenType::Access, Duration::seconds(-120)),
        TEST_JWT_SECRET,
    )
    .unwrap();
    let (status, body) = send(&app, Method::GET, "/v1/auth/me", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired");

    let forged = create_token(
        &Claims::new(Uuid::new_v4(), TokenType::Access),
        "some-other-secret-that-is-32-bytes-long",
    )
    .unwrap();
    let (status, _) = send(&app, Method::GET, "/v1/auth/me", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let app = lazy_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({
            "email": "not-an-email",
            "password": "quizdesk-pass-1",
            "firstname": "Ann",
            "lastname": "Lee",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "email");

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({
            "email": "ann@example.com",
            "password": "lettersonly",
            "firstname": "Ann",
            "lastname": "Lee",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_blank_names_rejected() {
    let app = lazy_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({
            "email": "ann@example.com",
            "password": "quizdesk-pass-1",
            "firstname": "   ",
            "lastname": "Lee",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "firstname");

    let owner = token(TokenType::Access);
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/companies",
        Some(&owner),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = lazy_app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/refresh",
        None,
        Some(json!({ "refresh_token": token(TokenType::Access) })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = lazy_app();

    let (status, _) = send(&app, Method::GET, "/v1/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_database_down() {
    let app = lazy_app();

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["redis"], "disabled");
}

#[tokio::test]
async fn test_security_headers_on_errors() {
    use tower::ServiceExt;

    let response = lazy_app()
        .oneshot(
            axum::http::Request::builder()
                .uri("/v1/auth/me")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert!(response.headers().get(header::STRICT_TRANSPORT_SECURITY).is_none());
}
