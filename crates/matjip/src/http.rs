//! HTTP helpers shared by the search and cache clients.

use reqwest::Client;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default connect timeout for backend clients.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates a configured HTTP client with a request timeout.
#[must_use]
pub fn create_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Checks that `url` uses one of the allowed schemes.
pub fn validate_url(url: &str, allowed_schemes: &[&str]) -> Result<()> {
    let has_valid_scheme = allowed_schemes
        .iter()
        .any(|scheme| url.starts_with(&format!("{scheme}://")));

    if !has_valid_scheme {
        return Err(Error::Config(format!(
            "Invalid URL scheme in '{}'. Allowed: {}",
            url,
            allowed_schemes.join(", ")
        )));
    }

    let host = url.split("://").nth(1).unwrap_or_default();
    if host.trim_matches('/').is_empty() {
        return Err(Error::Config(format!("Invalid URL format: {}", url)));
    }

    Ok(())
}

/// Maps a non-success HTTP response to a backend error.
pub fn handle_http_error(backend: &'static str, status_code: u16, body: &str) -> Error {
    Error::backend(backend, format!("HTTP {}: {}", status_code, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_valid_http() {
        assert!(validate_url("http://localhost:9200", &["http", "https"]).is_ok());
        assert!(validate_url("https://search.matjip.kr", &["http", "https"]).is_ok());
    }

    #[test]
    fn test_validate_url_valid_postgres() {
        assert!(validate_url("postgres://db/matjip", &["postgres", "postgresql"]).is_ok());
    }

    #[test]
    fn test_validate_url_invalid_scheme() {
        assert!(validate_url("ftp://files.example.com", &["http", "https"]).is_err());
        assert!(validate_url("file:///etc/passwd", &["http", "https"]).is_err());
    }

    #[test]
    fn test_validate_url_missing_host() {
        assert!(validate_url("http://", &["http"]).is_err());
    }

    #[test]
    fn test_handle_http_error_is_transient() {
        let err = handle_http_error("elasticsearch", 503, "unavailable");
        assert!(err.is_transient());
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn test_create_http_client() {
        let client = create_http_client(Duration::from_secs(1));
        assert!(client.get("http://example.com").build().is_ok());
    }
}
