//! Router-level tests: authentication and role checks that reject a request
//! before any query runs. The pool connects lazily and is never used.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use librarium_server::{
    api,
    config::AppConfig,
    models::{Role, UserClaims},
    AppState,
};

const SECRET: &str = "router-test-secret";

fn app() -> Router {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = SECRET.to_string();

    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");

    api::create_router(AppState::new(config, pool))
}

fn token(user_id: i32, role: Role) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: user_id.to_string(),
        user_id,
        email: format!("user{}@example.org", user_id),
        role,
        exp: now + 3600,
        iat: now,
    }
    .create_token(SECRET)
    .expect("token")
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn test_health_is_public() {
    let response = app().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let response = app().oneshot(get("/api/books", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["code"], 2);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let now = Utc::now().timestamp();
    let forged = UserClaims {
        sub: "1".to_string(),
        user_id: 1,
        email: "admin@example.org".to_string(),
        role: Role::Admin,
        exp: now + 3600,
        iat: now,
    }
    .create_token("not-the-secret")
    .unwrap();

    let response = app().oneshot(get("/api/users", Some(&forged))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let now = Utc::now().timestamp();
    let expired = UserClaims {
        sub: "4".to_string(),
        user_id: 4,
        email: "user4@example.org".to_string(),
        role: Role::User,
        exp: now - 7200,
        iat: now - 10800,
    }
    .create_token(SECRET)
    .unwrap();

    let response = app().oneshot(get("/api/books", Some(&expired))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_role_cannot_manage_users() {
    let token = token(4, Role::User);

    let response = app().oneshot(get("/api/users", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Forbidden");

    let request = Request::builder()
        .method("PUT")
        .uri("/api/users/4/role")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"role":"admin"}"#))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_per_user_views_reject_other_users() {
    let token = token(4, Role::User);

    let response = app()
        .oneshot(get("/api/checkouts/user/5", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app()
        .oneshot(get("/api/stats/user/5", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = app()
        .oneshot(get("/api-docs/openapi.json", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["paths"]["/api/checkouts"].is_object());
}
