//! Tests for the Redis REST cache.

use super::*;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(url: &str) -> RedisRestConfig {
    RedisRestConfig {
        url: url.to_string(),
        password: None,
        timeout_ms: 1_000,
    }
}

#[test]
fn test_redis_rest_config_defaults() {
    let json = r#"{"url":"http://localhost:8079"}"#;
    let config: RedisRestConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.timeout_ms, 5_000);
    assert!(config.password.is_none());
}

#[test]
fn test_command_url_trailing_slash() {
    let cache = RedisRestCache::new(test_config("http://localhost:8079/"));
    assert_eq!(cache.command_url("GET"), "http://localhost:8079/GET");
}

#[tokio::test]
async fn test_get_existing_key() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/GET"))
        .and(body_json(serde_json::json!({ "args": ["42"] })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "3,1,2" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let cache = RedisRestCache::new(test_config(&server.uri()));

    // Act
    let value = cache.get("42").await.unwrap();

    // Assert
    assert_eq!(value.as_deref(), Some("3,1,2"));
}

#[tokio::test]
async fn test_get_missing_key_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": null })))
        .mount(&server)
        .await;
    let cache = RedisRestCache::new(test_config(&server.uri()));

    assert!(cache.get("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": "1" })))
        .expect(1)
        .mount(&server)
        .await;
    let mut config = test_config(&server.uri());
    config.password = Some("hunter2".to_string());
    let cache = RedisRestCache::new(config);

    assert_eq!(cache.get("default").await.unwrap().as_deref(), Some("1"));
}

#[tokio::test]
async fn test_gateway_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;
    let cache = RedisRestCache::new(test_config(&server.uri()));

    let err = cache.get("1").await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(
        err.to_string(),
        "[MATJIP-004] cache unavailable: HTTP 503: Service Unavailable"
    );
}

#[tokio::test]
async fn test_unreachable_gateway_is_transient() {
    let cache = RedisRestCache::new(test_config("http://127.0.0.1:1"));
    assert!(cache.get("1").await.unwrap_err().is_transient());
}
