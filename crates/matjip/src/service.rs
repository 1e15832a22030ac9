//! Pipeline entry points.
//!
//! [`RestaurantSearchService`] wires the compiler, executor, like resolver,
//! hydrator and sampler around collaborators built once at startup.

use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::RecommendationCache;
use crate::config::MatjipConfig;
use crate::error::{Error, Result};
use crate::filter::RestaurantFilter;
use crate::hydrate::Hydrator;
use crate::likes::LikeSetResolver;
use crate::model::{Page, RestaurantId, RestaurantView, UserId};
use crate::query::compile;
use crate::recommend::{RecommendationKeys, RecommendationSampler};
use crate::search::{SearchBackend, SearchExecutor};
use crate::store::RestaurantStore;

/// Search, detail and recommendation calls.
pub struct RestaurantSearchService {
    executor: SearchExecutor,
    store: Arc<dyn RestaurantStore>,
    likes: LikeSetResolver,
    hydrator: Hydrator,
    sampler: RecommendationSampler,
}

impl RestaurantSearchService {
    /// Builds the service from its collaborators.
    #[must_use]
    pub fn new(
        search: Arc<dyn SearchBackend>,
        store: Arc<dyn RestaurantStore>,
        cache: Arc<dyn RecommendationCache>,
        config: &MatjipConfig,
    ) -> Self {
        let hydrator = Hydrator::new(store.clone());
        let sampler = RecommendationSampler::new(
            cache,
            hydrator.clone(),
            RecommendationKeys::from(&config.cache),
            &config.recommendation,
        );
        Self {
            executor: SearchExecutor::new(search, config.search.window_size),
            likes: LikeSetResolver::new(store.clone()),
            store,
            hydrator,
            sampler,
        }
    }

    /// Searches restaurants and returns page `page` (zero-based) of `size`.
    ///
    /// At most `window_size` candidates are considered; `total_hits` on the
    /// returned page is the backend's own total, so a caller can tell when
    /// later pages were cut off by the window. With `like` set it counts the
    /// liked candidates instead.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a zero `size`, or the first backend or
    /// store failure.
    pub async fn search(
        &self,
        filter: &RestaurantFilter,
        page: usize,
        size: usize,
        user: Option<UserId>,
    ) -> Result<Page<RestaurantView>> {
        if size == 0 {
            return Err(Error::InvalidArgument("page size must be at least 1".to_string()));
        }
        info!(
            query = filter.text(),
            categories = filter.categories.len(),
            like = filter.like,
            sort = ?filter.sort,
            page,
            size,
            "Restaurant search"
        );

        let query = compile(filter);
        let (hits, ids, total_hits) = if filter.like {
            let (hits, liked) =
                tokio::try_join!(self.executor.execute(&query), self.likes.liked_ids(user))?;
            let ids: Vec<RestaurantId> = hits
                .candidates
                .iter()
                .map(|c| c.id)
                .filter(|id| liked.contains(id))
                .collect();
            let total_hits = ids.len() as u64;
            (hits, ids, total_hits)
        } else {
            let hits = self.executor.execute(&query).await?;
            let ids = hits.ids();
            let total_hits = hits.total_hits;
            (hits, ids, total_hits)
        };
        debug!(candidates = hits.candidates.len(), kept = ids.len(), "Candidates selected");

        let views = self.hydrator.hydrate(&ids, user).await?;
        Ok(Page::slice(views, page, size, total_hits))
    }

    /// Full view of one restaurant. Counts as a view.
    ///
    /// # Errors
    ///
    /// Returns `RestaurantNotFound`, or a store failure.
    pub async fn detail(
        &self,
        restaurant: RestaurantId,
        user: Option<UserId>,
    ) -> Result<RestaurantView> {
        info!(restaurant, "Restaurant detail");
        if !self.store.increment_view_count(restaurant).await? {
            return Err(Error::RestaurantNotFound(restaurant));
        }
        self.hydrator
            .hydrate(&[restaurant], user)
            .await?
            .into_iter()
            .next()
            .ok_or(Error::RestaurantNotFound(restaurant))
    }

    /// Bounded recommendation list for `user`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedState` for an unparsable cached list, or a cache or
    /// store failure.
    pub async fn recommend(&self, user: Option<UserId>) -> Result<Vec<RestaurantView>> {
        info!(?user, "Recommendations");
        self.sampler.recommend(user).await
    }
}
