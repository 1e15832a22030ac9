//! Elasticsearch/OpenSearch search backend.
//!
//! Sends compiled queries to `{url}/{index}/_search` and reads ranked hits
//! back. Document `_id`s are restaurant IDs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::http::{create_http_client, handle_http_error};
use crate::query::SearchQuery;
use crate::search::{Candidate, SearchBackend, SearchHits};

const BACKEND: &str = "elasticsearch";

/// Configuration for the Elasticsearch backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch/OpenSearch URL (e.g., http://localhost:9200).
    pub url: String,
    /// Index holding restaurant documents.
    #[serde(default = "default_index")]
    pub index: String,
    /// Optional username for Basic auth.
    pub username: Option<String>,
    /// Optional password for Basic auth.
    pub password: Option<String>,
    /// Optional API key for authentication.
    pub api_key: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_index() -> String {
    "restaurant".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Search response from Elasticsearch.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsContainer,
}

#[derive(Debug, Deserialize)]
struct HitsContainer {
    #[serde(default)]
    total: Option<TotalHits>,
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct TotalHits {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: serde_json::Value,
}

/// Elasticsearch/OpenSearch backend.
pub struct ElasticsearchBackend {
    config: ElasticsearchConfig,
    client: Client,
}

impl ElasticsearchBackend {
    /// Creates a backend with a configured HTTP client.
    pub fn new(config: ElasticsearchConfig) -> Self {
        let client = create_http_client(Duration::from_millis(config.timeout_ms));
        Self { config, client }
    }

    /// Builds the search URL for the index.
    fn build_search_url(&self) -> String {
        format!(
            "{}/{}/_search",
            self.config.url.trim_end_matches('/'),
            self.config.index.trim_start_matches('/')
        )
    }

    /// Makes an authenticated request.
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(url);
        req = req.header("Content-Type", "application/json");

        if let Some(api_key) = &self.config.api_key {
            req = req.header("Authorization", format!("ApiKey {}", api_key));
        } else if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            req = req.basic_auth(user, Some(pass));
        }

        req
    }

    fn into_hits(response: SearchResponse) -> Result<SearchHits> {
        let candidates = response
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let id = hit.id.parse().map_err(|_| {
                    Error::MalformedState(format!("search hit id '{}' is not an integer", hit.id))
                })?;
                Ok(Candidate {
                    id,
                    score: hit.score.unwrap_or(0.0),
                    source: hit.source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total_hits = response
            .hits
            .total
            .map_or(candidates.len() as u64, |t| t.value);

        Ok(SearchHits {
            total_hits,
            candidates,
        })
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    fn backend_type(&self) -> &'static str {
        BACKEND
    }

    async fn search(&self, query: &SearchQuery, size: usize, from: usize) -> Result<SearchHits> {
        let url = self.build_search_url();
        let body = query.to_body(size, from);

        let response = self
            .build_request(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::backend(BACKEND, format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(handle_http_error(BACKEND, status.as_u16(), &body));
        }

        let search_resp: SearchResponse = response.json().await.map_err(|e| {
            Error::backend(BACKEND, format!("failed to parse search response: {}", e))
        })?;

        Self::into_hits(search_resp)
    }
}

#[cfg(test)]
#[path = "elasticsearch_tests.rs"]
mod tests;
