//! Search Executor and the search backends it runs against.

pub mod elasticsearch;
pub mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::model::RestaurantId;
use crate::query::SearchQuery;

pub use elasticsearch::{ElasticsearchBackend, ElasticsearchConfig};
pub use memory::MemorySearchIndex;

/// Default candidate window: the executor over-fetches this many hits and
/// pagination happens after hydration.
pub const CANDIDATE_WINDOW: usize = 500;

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Restaurant identifier.
    pub id: RestaurantId,
    /// Relevance score as reported by the backend.
    pub score: f32,
    /// Raw document fields.
    pub source: serde_json::Value,
}

/// Ranked candidates for one result window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    /// Total matches in the index, independent of the window.
    pub total_hits: u64,
    /// Candidates in rank order.
    pub candidates: Vec<Candidate>,
}

impl SearchHits {
    /// Candidate IDs in rank order.
    #[must_use]
    pub fn ids(&self) -> Vec<RestaurantId> {
        self.candidates.iter().map(|c| c.id).collect()
    }
}

/// A search index holding restaurant documents.
///
/// Implementations return either the whole window or an error; partial
/// results are never returned.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Backend name used in logs and errors.
    fn backend_type(&self) -> &'static str;

    /// Runs `query` and returns hits `from..from + size` in rank order.
    async fn search(&self, query: &SearchQuery, size: usize, from: usize) -> Result<SearchHits>;
}

/// Issues compiled queries against the search backend with a fixed window.
#[derive(Clone)]
pub struct SearchExecutor {
    backend: Arc<dyn SearchBackend>,
    window_size: usize,
}

impl SearchExecutor {
    /// Creates an executor with the given candidate window.
    pub fn new(backend: Arc<dyn SearchBackend>, window_size: usize) -> Self {
        Self {
            backend,
            window_size,
        }
    }

    /// Returns the candidate window size.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Fetches the first `window_size` candidates for `query`.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the backend call fails.
    pub async fn execute(&self, query: &SearchQuery) -> Result<SearchHits> {
        let hits = self.backend.search(query, self.window_size, 0).await?;
        debug!(
            backend = self.backend.backend_type(),
            candidates = hits.candidates.len(),
            total_hits = hits.total_hits,
            "search executed"
        );
        Ok(hits)
    }
}
