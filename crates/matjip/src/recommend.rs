//! Recommendation sampling.
//!
//! A precomputed, comma-separated list of restaurant IDs is kept in the
//! cache per user, plus a default list. The sampler reads the user's list
//! (falling back to the default), hydrates it and returns at most
//! `sample_size` restaurants, drawn uniformly without replacement.

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

use crate::cache::RecommendationCache;
use crate::config::{CacheConfig, RecommendationConfig};
use crate::error::{Error, Result};
use crate::hydrate::Hydrator;
use crate::model::{RestaurantId, RestaurantView, UserId};

/// Cache key layout for recommendation lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationKeys {
    /// Prepended to every key.
    pub prefix: String,
    /// Suffix of the fallback list.
    pub default_key: String,
}

impl RecommendationKeys {
    /// Key of a user's list.
    #[must_use]
    pub fn user(&self, user: UserId) -> String {
        format!("{}{}", self.prefix, user)
    }

    /// Key of the fallback list.
    #[must_use]
    pub fn fallback(&self) -> String {
        format!("{}{}", self.prefix, self.default_key)
    }
}

impl Default for RecommendationKeys {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for RecommendationKeys {
    fn from(config: &CacheConfig) -> Self {
        Self {
            prefix: config.key_prefix.clone(),
            default_key: config.default_key.clone(),
        }
    }
}

/// Parses a cached ID list.
///
/// An empty or blank value is an empty list. Any token that is not an
/// integer fails the whole list.
///
/// # Errors
///
/// Returns `MalformedState` naming the offending token.
pub fn parse_id_list(value: &str) -> Result<Vec<RestaurantId>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<RestaurantId>().map_err(|_| {
                Error::MalformedState(format!("invalid restaurant id '{token}' in recommendation list"))
            })
        })
        .collect()
}

/// Serves bounded recommendation lists.
pub struct RecommendationSampler {
    cache: Arc<dyn RecommendationCache>,
    hydrator: Hydrator,
    keys: RecommendationKeys,
    sample_size: usize,
}

impl RecommendationSampler {
    /// Creates a sampler.
    #[must_use]
    pub fn new(
        cache: Arc<dyn RecommendationCache>,
        hydrator: Hydrator,
        keys: RecommendationKeys,
        config: &RecommendationConfig,
    ) -> Self {
        Self {
            cache,
            hydrator,
            keys,
            sample_size: config.sample_size,
        }
    }

    /// Recommendations for `user`, sampled with the thread RNG.
    ///
    /// # Errors
    ///
    /// Returns `MalformedState` for an unparsable list, or a cache or store
    /// failure.
    pub async fn recommend(&self, user: Option<UserId>) -> Result<Vec<RestaurantView>> {
        let views = self.candidates(user).await?;
        Ok(self.sample(views, &mut rand::thread_rng()))
    }

    /// Recommendations for `user`, sampled with `rng`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::recommend`].
    pub async fn recommend_with_rng<R: Rng + Send + ?Sized>(
        &self,
        user: Option<UserId>,
        rng: &mut R,
    ) -> Result<Vec<RestaurantView>> {
        let views = self.candidates(user).await?;
        Ok(self.sample(views, rng))
    }

    async fn cached_list(&self, user: Option<UserId>) -> Result<Option<String>> {
        if let Some(user) = user {
            if let Some(value) = self.cache.get(&self.keys.user(user)).await? {
                return Ok(Some(value));
            }
        }
        self.cache.get(&self.keys.fallback()).await
    }

    async fn candidates(&self, user: Option<UserId>) -> Result<Vec<RestaurantView>> {
        let Some(value) = self.cached_list(user).await? else {
            debug!(?user, "No recommendation list cached");
            return Ok(Vec::new());
        };
        let ids = parse_id_list(&value)?;
        self.hydrator.hydrate(&ids, user).await
    }

    fn sample<R: Rng + ?Sized>(&self, views: Vec<RestaurantView>, rng: &mut R) -> Vec<RestaurantView> {
        debug!(
            candidates = views.len(),
            sample_size = self.sample_size,
            "Sampling recommendations"
        );
        if views.len() <= self.sample_size {
            return views;
        }
        views
            .choose_multiple(rng, self.sample_size)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "recommend_tests.rs"]
mod tests;
