//! Redis cache reached through a REST gateway.
//!
//! Commands are sent as `POST {url}/{COMMAND}` with a JSON body
//! `{"args": [...]}`; the gateway answers `{"result": ...}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::RecommendationCache;
use crate::error::{Error, Result};
use crate::http::{create_http_client, handle_http_error};

const BACKEND: &str = "cache";

/// Configuration for the Redis REST gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisRestConfig {
    /// Gateway URL (e.g., http://localhost:8079).
    pub url: String,
    /// Bearer token, if the gateway requires one.
    #[serde(default)]
    pub password: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Deserialize)]
struct CommandResponse<T> {
    result: Option<T>,
}

/// Redis cache client.
pub struct RedisRestCache {
    config: RedisRestConfig,
    client: Client,
}

impl RedisRestCache {
    /// Creates a client for the configured gateway.
    #[must_use]
    pub fn new(config: RedisRestConfig) -> Self {
        let client = create_http_client(Duration::from_millis(config.timeout_ms));
        Self { config, client }
    }

    fn command_url(&self, command: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), command)
    }

    async fn execute_command<T: for<'de> Deserialize<'de>>(
        &self,
        command: &str,
        args: &[&str],
    ) -> Result<Option<T>> {
        let mut request = self.client.post(self.command_url(command));
        if let Some(password) = &self.config.password {
            request = request.header("Authorization", format!("Bearer {password}"));
        }

        let response = request
            .json(&serde_json::json!({ "args": args }))
            .send()
            .await
            .map_err(|e| Error::backend(BACKEND, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(handle_http_error(BACKEND, status.as_u16(), &body));
        }

        let parsed: CommandResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::backend(BACKEND, format!("failed to parse response: {e}")))?;
        Ok(parsed.result)
    }
}

#[async_trait]
impl RecommendationCache for RedisRestCache {
    fn cache_type(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.execute_command("GET", &[key]).await
    }
}

#[cfg(test)]
#[path = "redis_tests.rs"]
mod tests;
