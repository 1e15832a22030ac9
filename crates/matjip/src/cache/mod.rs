//! Key-value cache holding precomputed recommendation lists.

pub mod memory;
pub mod redis;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryCache;
pub use redis::{RedisRestCache, RedisRestConfig};

/// Read access to the recommendation cache.
#[async_trait]
pub trait RecommendationCache: Send + Sync {
    /// Returns the cache type name.
    fn cache_type(&self) -> &'static str;

    /// Returns the value stored at `key`, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;
}
