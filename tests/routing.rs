mod common;

use common::{UNREACHABLE_DB, offline_state, start_server, test_config};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_and_api_root_respond_without_auth() {
    let config = test_config(UNREACHABLE_DB);
    let server = start_server(offline_state(&config), &config).await;

    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = server.client.get(server.url("/api")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Hello 🌍");

    server.stop().await;
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() {
    let config = test_config(UNREACHABLE_DB);
    let server = start_server(offline_state(&config), &config).await;

    let resp = server
        .client
        .get(server.url("/api/nothing-here"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Route not found");

    server.stop().await;
}

#[tokio::test]
async fn protected_routes_reject_missing_credentials() {
    let config = test_config(UNREACHABLE_DB);
    let server = start_server(offline_state(&config), &config).await;

    let requests = [
        server.client.get(server.url("/api/product")),
        server.client.post(server.url("/api/product")).json(&serde_json::json!({})),
        server.client.get(server.url("/api/product/1")),
        server.client.get(server.url("/api/product/upload/url?fileName=a.png&fileType=image/png")),
        server.client.get(server.url("/api/category")),
        server.client.delete(server.url("/api/category/1")),
        server.client.get(server.url("/api/user")),
        server.client.get(server.url("/api/user/me")),
        server.client.put(server.url("/api/user/1")).json(&serde_json::json!({})),
        server.client.delete(server.url("/api/user/logout")).json(&serde_json::json!({})),
    ];

    for request in requests {
        let resp = request.send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Authentication required");
    }

    server.stop().await;
}

#[tokio::test]
async fn malformed_and_forged_tokens_are_rejected() {
    let config = test_config(UNREACHABLE_DB);
    let server = start_server(offline_state(&config), &config).await;

    let resp = server
        .client
        .get(server.url("/api/category"))
        .header("authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid token format");

    let resp = server
        .client
        .get(server.url("/api/category"))
        .bearer_auth("definitely.not.valid")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Expired Token - Access Restricted!");

    server.stop().await;
}

#[tokio::test]
async fn malformed_json_gets_a_400_envelope() {
    let config = test_config(UNREACHABLE_DB);
    let server = start_server(offline_state(&config), &config).await;

    let resp = server
        .client
        .post(server.url("/api/user/register"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");

    server.stop().await;
}

#[tokio::test]
async fn registration_validation_happens_before_storage() {
    let config = test_config(UNREACHABLE_DB);
    let server = start_server(offline_state(&config), &config).await;

    let resp = server
        .client
        .post(server.url("/api/user/register"))
        .json(&serde_json::json!({ "email": "not-an-email", "password": "abc" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Bad Request");

    let fields: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["userName", "email", "password"]);

    server.stop().await;
}

#[tokio::test]
async fn refresh_requires_a_token_field() {
    let config = test_config(UNREACHABLE_DB);
    let server = start_server(offline_state(&config), &config).await;

    let resp = server
        .client
        .post(server.url("/api/user/token/refresh"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"][0]["field"], "refreshToken");

    server.stop().await;
}
