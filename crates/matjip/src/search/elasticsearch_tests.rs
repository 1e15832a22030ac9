//! Tests for the Elasticsearch backend.

use super::*;
use crate::filter::RestaurantFilter;
use crate::query::compile;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(url: &str) -> ElasticsearchConfig {
    ElasticsearchConfig {
        url: url.to_string(),
        index: "restaurant".to_string(),
        username: None,
        password: None,
        api_key: None,
        timeout_ms: 2_000,
    }
}

fn hits_body(ids: &[&str], total: u64) -> serde_json::Value {
    let hits: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            serde_json::json!({
                "_id": id,
                "_score": 10.0 - i as f64,
                "_source": { "name": format!("restaurant {id}") }
            })
        })
        .collect();
    serde_json::json!({ "hits": { "total": { "value": total, "relation": "eq" }, "hits": hits } })
}

#[test]
fn test_elasticsearch_config_defaults() {
    let json = r#"{"url":"http://localhost:9200"}"#;
    let config: ElasticsearchConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.index, "restaurant");
    assert_eq!(config.timeout_ms, 30_000);
    assert!(config.api_key.is_none());
}

#[test]
fn test_build_search_url_trailing_slash() {
    let backend = ElasticsearchBackend::new(test_config("http://localhost:9200/"));
    assert_eq!(
        backend.build_search_url(),
        "http://localhost:9200/restaurant/_search"
    );
}

#[test]
fn test_search_response_deserialization() {
    let json = r#"{"hits":{"total":{"value":2},"hits":[{"_id":"7","_score":1.5,"_source":{"name":"A"}},{"_id":"3","_score":null,"_source":{}}]}}"#;
    let response: SearchResponse = serde_json::from_str(json).unwrap();
    let hits = ElasticsearchBackend::into_hits(response).unwrap();
    assert_eq!(hits.ids(), vec![7, 3]);
    assert_eq!(hits.total_hits, 2);
    assert!((hits.candidates[1].score - 0.0).abs() < f32::EPSILON);
}

#[test]
fn test_non_numeric_id_is_malformed() {
    let json = r#"{"hits":{"hits":[{"_id":"abc","_source":{}}]}}"#;
    let response: SearchResponse = serde_json::from_str(json).unwrap();
    let err = ElasticsearchBackend::into_hits(response).unwrap_err();
    assert!(matches!(err, Error::MalformedState(_)));
}

#[tokio::test]
async fn test_search_preserves_rank_order() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restaurant/_search"))
        .and(body_partial_json(serde_json::json!({ "size": 500, "from": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits_body(&["5", "1", "9"], 3)))
        .expect(1)
        .mount(&server)
        .await;
    let backend = ElasticsearchBackend::new(test_config(&server.uri()));

    // Act
    let hits = backend
        .search(&compile(&RestaurantFilter::default()), 500, 0)
        .await
        .unwrap();

    // Assert
    assert_eq!(hits.ids(), vec![5, 1, 9]);
    assert_eq!(hits.total_hits, 3);
}

#[tokio::test]
async fn test_search_sends_compiled_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restaurant/_search"))
        .and(body_partial_json(serde_json::json!({
            "query": { "bool": { "filter": [ { "exists": { "field": "discountContent" } } ] } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits_body(&["2"], 1)))
        .expect(1)
        .mount(&server)
        .await;
    let backend = ElasticsearchBackend::new(test_config(&server.uri()));
    let filter = RestaurantFilter {
        discount_for_skku: Some(true),
        ..Default::default()
    };

    let hits = backend.search(&compile(&filter), 500, 0).await.unwrap();

    assert_eq!(hits.ids(), vec![2]);
}

#[tokio::test]
async fn test_search_uses_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "ApiKey secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits_body(&[], 0)))
        .expect(1)
        .mount(&server)
        .await;
    let mut config = test_config(&server.uri());
    config.api_key = Some("secret".to_string());
    let backend = ElasticsearchBackend::new(config);

    let hits = backend
        .search(&compile(&RestaurantFilter::default()), 10, 0)
        .await
        .unwrap();

    assert!(hits.candidates.is_empty());
}

#[tokio::test]
async fn test_server_error_is_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("no shards"))
        .mount(&server)
        .await;
    let backend = ElasticsearchBackend::new(test_config(&server.uri()));

    let err = backend
        .search(&compile(&RestaurantFilter::default()), 500, 0)
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert!(err.to_string().contains("no shards"));
}

#[tokio::test]
async fn test_garbage_body_is_backend_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;
    let backend = ElasticsearchBackend::new(test_config(&server.uri()));

    let err = backend
        .search(&compile(&RestaurantFilter::default()), 500, 0)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::BackendUnavailable { .. }));
}
