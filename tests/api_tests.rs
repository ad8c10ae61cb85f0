//! API integration tests
//!
//! These hit a running server with seeded catalog data. Run with:
//! cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_issue_and_return_flow() {
    let client = Client::new();

    let response = client
        .post(format!("{}/circulation/issue", BASE_URL))
        .json(&json!({ "student_id": 1, "book_id": 1 }))
        .send()
        .await
        .expect("Failed to send issue request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse issue response");
    assert!(body["transaction_id"].is_string());

    // Issuing the same book again must conflict
    let response = client
        .post(format!("{}/circulation/issue", BASE_URL))
        .json(&json!({ "student_id": 1, "book_id": 1 }))
        .send()
        .await
        .expect("Failed to send second issue request");
    assert_eq!(response.status(), 409);

    let response = client
        .post(format!("{}/circulation/return", BASE_URL))
        .json(&json!({ "student_id": 1, "book_id": 1 }))
        .send()
        .await
        .expect("Failed to send return request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse return response");
    assert!(body["transaction_id"].is_string());
    assert_eq!(body["fine_amount"], 0);
}

#[tokio::test]
#[ignore]
async fn test_recent_transactions_and_stats() {
    let client = Client::new();

    let response = client
        .get(format!("{}/transactions?limit=5", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_books"].is_number());
    assert!(body["borrowed_percentage"].is_number());
}
