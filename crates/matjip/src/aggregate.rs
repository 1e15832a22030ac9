//! Incremental restaurant aggregates.
//!
//! Rating and like statistics are updated in O(1) per mutation from the
//! previous value and the event, never by recounting. The arithmetic lives in
//! pure functions on [`RatingAggregate`]; [`AggregateMaintainer`] reads the
//! row, applies one of them and persists the result with a single write,
//! inside the caller's [`StoreTransaction`] so the triggering row change and
//! the aggregate commit together.
//!
//! Concurrent mutations of the same restaurant rely on the store's row
//! locking. A store without it can lose an update between two simultaneous
//! read-modify-write cycles.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{RestaurantId, UserId};
use crate::store::{RestaurantStore, StoreTransaction};

/// Average rating and review count of one restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    /// Mean of all review ratings, 0 when there are none.
    pub rating_avg: f64,
    /// Number of reviews.
    pub review_count: u32,
}

impl RatingAggregate {
    /// State after a review with `rating` is added.
    #[must_use]
    pub fn on_review_created(self, rating: f64) -> Self {
        let old_count = f64::from(self.review_count);
        let review_count = self.review_count + 1;
        Self {
            rating_avg: (self.rating_avg * old_count + rating) / f64::from(review_count),
            review_count,
        }
    }

    /// State after a review with `rating` is removed.
    ///
    /// Removing the last review resets the aggregate regardless of `rating`.
    #[must_use]
    pub fn on_review_deleted(self, rating: f64) -> Self {
        if self.review_count <= 1 {
            return Self::default();
        }
        let old_count = f64::from(self.review_count);
        Self {
            rating_avg: (self.rating_avg * old_count - rating) / (old_count - 1.0),
            review_count: self.review_count - 1,
        }
    }

    /// State after a review's rating changes from `old_rating` to `new_rating`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedState` when the aggregate records no reviews, since
    /// there is then no review to update.
    pub fn on_review_updated(self, old_rating: f64, new_rating: f64) -> Result<Self> {
        if self.review_count == 0 {
            return Err(Error::MalformedState(
                "rating update on a restaurant with no reviews".to_string(),
            ));
        }
        let count = f64::from(self.review_count);
        Ok(Self {
            rating_avg: (self.rating_avg * count - old_rating + new_rating) / count,
            review_count: self.review_count,
        })
    }
}

/// Like count after a like toggle.
///
/// Only a real state change moves the counter: liking something already
/// liked, or unliking something not liked, returns `current`.
#[must_use]
pub fn next_like_count(current: u32, liked: bool, already_liked: bool) -> u32 {
    match (liked, already_liked) {
        (true, false) => current.saturating_add(1),
        (false, true) => current.saturating_sub(1),
        _ => current,
    }
}

/// Applies aggregate events to restaurant rows.
pub struct AggregateMaintainer {
    store: Arc<dyn RestaurantStore>,
}

impl AggregateMaintainer {
    /// Creates a maintainer writing through `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RestaurantStore>) -> Self {
        Self { store }
    }

    async fn current_rating(
        tx: &mut dyn StoreTransaction,
        restaurant: RestaurantId,
    ) -> Result<RatingAggregate> {
        tx.find_restaurant(restaurant)
            .await?
            .map(|r| r.rating())
            .ok_or(Error::RestaurantNotFound(restaurant))
    }

    async fn save(
        tx: &mut dyn StoreTransaction,
        restaurant: RestaurantId,
        next: RatingAggregate,
    ) -> Result<RatingAggregate> {
        tx.save_rating_aggregate(restaurant, next).await?;
        debug!(
            restaurant,
            rating_avg = next.rating_avg,
            review_count = next.review_count,
            "Rating aggregate updated"
        );
        Ok(next)
    }

    /// Records a new review within `tx`.
    ///
    /// # Errors
    ///
    /// Returns `RestaurantNotFound` or a store failure.
    pub async fn on_review_created(
        &self,
        tx: &mut dyn StoreTransaction,
        restaurant: RestaurantId,
        rating: f64,
    ) -> Result<RatingAggregate> {
        let next = Self::current_rating(tx, restaurant)
            .await?
            .on_review_created(rating);
        Self::save(tx, restaurant, next).await
    }

    /// Records a removed review within `tx`.
    ///
    /// # Errors
    ///
    /// Returns `RestaurantNotFound` or a store failure.
    pub async fn on_review_deleted(
        &self,
        tx: &mut dyn StoreTransaction,
        restaurant: RestaurantId,
        rating: f64,
    ) -> Result<RatingAggregate> {
        let next = Self::current_rating(tx, restaurant)
            .await?
            .on_review_deleted(rating);
        Self::save(tx, restaurant, next).await
    }

    /// Records a changed review rating within `tx`.
    ///
    /// # Errors
    ///
    /// Returns `RestaurantNotFound`, `MalformedState` when the row has no
    /// reviews, or a store failure.
    pub async fn on_review_updated(
        &self,
        tx: &mut dyn StoreTransaction,
        restaurant: RestaurantId,
        old_rating: f64,
        new_rating: f64,
    ) -> Result<RatingAggregate> {
        let next = Self::current_rating(tx, restaurant)
            .await?
            .on_review_updated(old_rating, new_rating)?;
        Self::save(tx, restaurant, next).await
    }

    /// Sets whether `user` likes `restaurant` and returns the resulting like count.
    ///
    /// The like row and the counter change in one transaction. Repeating the
    /// same toggle is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RestaurantNotFound` or a store failure.
    pub async fn on_like_toggled(
        &self,
        user: UserId,
        restaurant: RestaurantId,
        liked: bool,
    ) -> Result<u32> {
        let mut tx = self.store.begin().await?;
        let current = tx
            .find_restaurant(restaurant)
            .await?
            .ok_or(Error::RestaurantNotFound(restaurant))?
            .like_count;
        let already_liked = tx.like_exists(user, restaurant).await?;
        if liked == already_liked {
            return Ok(current);
        }
        let next = next_like_count(current, liked, already_liked);

        if liked {
            tx.insert_like(user, restaurant).await?;
        } else {
            tx.delete_like(user, restaurant).await?;
        }
        tx.save_like_count(restaurant, next).await?;
        tx.commit().await?;
        debug!(user, restaurant, liked, like_count = next, "Like count updated");
        Ok(next)
    }
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
