//! API integration tests against a running server
//!
//! Run with: cargo test --test api_tests -- --ignored
//! `LIBRARIUM_TEST_URL` overrides the default `http://localhost:8080`.

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

fn base_url() -> String {
    std::env::var("LIBRARIUM_TEST_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos()
}

/// Register a fresh account and return (token, user id)
async fn register(client: &Client) -> (String, i64) {
    let suffix = unique_suffix();
    let response = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "name": "Test Reader",
            "email": format!("reader{}@example.org", suffix),
            "password": "reading-is-fun"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse register response");
    (
        body["token"].as_str().expect("No token in response").to_string(),
        body["user"]["id"].as_i64().expect("No user id in response"),
    )
}

async fn create_book(client: &Client, token: &str) -> i64 {
    let response = client
        .post(format!("{}/api/books", base_url()))
        .bearer_auth(token)
        .json(&json!({
            "title": format!("Test Book {}", unique_suffix()),
            "author": "Test Author"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "available");
    body["id"].as_i64().expect("No book id")
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let response = Client::new()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let response = Client::new()
        .get(format!("{}/ready", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_register_login_and_me() {
    let client = Client::new();
    let suffix = unique_suffix();
    let email = format!("login{}@example.org", suffix);

    let response = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "name": "Login Reader",
            "email": email,
            "password": "correct horse",
            "role": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());

    let response = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": "correct horse" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["token_type"], "Bearer");
    let token = body["token"].as_str().expect("No token").to_string();

    let response = client
        .get(format!("{}/api/auth/me", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], email);
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = Client::new()
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": "nobody@example.org", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "InvalidCredential");
}

#[tokio::test]
#[ignore]
async fn test_checkout_and_return_round_trip() {
    let client = Client::new();
    let (token, user_id) = register(&client).await;
    let book_id = create_book(&client, &token).await;

    let response = client
        .post(format!("{}/api/checkouts", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book_id, "user_id": user_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let checkout: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(checkout["status"], "borrowed");
    assert_eq!(checkout["book"]["id"], book_id);
    let checkout_id = checkout["id"].as_i64().expect("No checkout id");

    // A borrowed book cannot be borrowed again
    let response = client
        .post(format!("{}/api/checkouts", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book_id, "user_id": user_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .put(format!("{}/api/checkouts/{}/return", base_url(), checkout_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "returned");
    assert!(returned["return_date"].is_string());

    let response = client
        .get(format!("{}/api/books/{}", base_url(), book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let book: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(book["status"], "available");

    let response = client
        .put(format!("{}/api/checkouts/{}/return", base_url(), checkout_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_list_books_pagination_shape() {
    let client = Client::new();
    let (token, _) = register(&client).await;

    let response = client
        .get(format!("{}/api/books?page=1&limit=5", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["books"].is_array());
    assert_eq!(body["pagination"]["limit"], 5);
    assert!(body["pagination"]["total_pages"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_user_stats_self_and_others() {
    let client = Client::new();
    let (token, user_id) = register(&client).await;

    let response = client
        .get(format!("{}/api/stats/user/{}", base_url(), user_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total_checkouts"], 0);

    let response = client
        .get(format!("{}/api/stats/user/{}", base_url(), user_id + 1_000_000))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_monthly_stats_lists_every_day() {
    let client = Client::new();
    let (token, _) = register(&client).await;

    let response = client
        .get(format!("{}/api/stats/monthly?year=2024&month=2", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["stats"].as_array().map(Vec::len), Some(29));
}

#[tokio::test]
#[ignore]
async fn test_users_endpoints_require_admin() {
    let client = Client::new();
    let (token, _) = register(&client).await;

    let response = client
        .get(format!("{}/api/users", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
