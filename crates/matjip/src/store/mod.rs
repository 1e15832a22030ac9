//! Relational system of record.
//!
//! [`RestaurantStore`] lists exactly the relational operations the pipeline
//! needs. Multi-row reads take a set of restaurant IDs and are answered with
//! one query each; callers must not rely on the order of returned rows.
//!
//! Review and like mutations go through a [`StoreTransaction`] so that the
//! row change and the restaurant aggregate commit together or not at all.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashSet;

use crate::aggregate::RatingAggregate;
use crate::error::Result;
use crate::model::{Menu, NewReview, Restaurant, RestaurantId, Review, ReviewId, UserId};

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::{PgStore, PgTransaction};

/// Category name attached to a restaurant through `restaurant_category`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    /// Restaurant identifier.
    pub restaurant_id: RestaurantId,
    /// Category name.
    pub name: String,
}

/// Relational store operations used by search, hydration and aggregates.
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    /// Restaurants whose IDs are in `ids`. Unknown IDs are skipped.
    async fn restaurants_by_ids(&self, ids: &[RestaurantId]) -> Result<Vec<Restaurant>>;

    /// Menus of the given restaurants, ordered by menu ID.
    async fn menus_by_restaurant_ids(&self, ids: &[RestaurantId]) -> Result<Vec<Menu>>;

    /// At most one review per restaurant: highest `like_count`, then lowest ID.
    async fn top_reviews_by_restaurant_ids(&self, ids: &[RestaurantId]) -> Result<Vec<Review>>;

    /// Category names of the given restaurants.
    async fn categories_by_restaurant_ids(&self, ids: &[RestaurantId]) -> Result<Vec<CategoryLink>>;

    /// Restaurants liked by `user`, optionally restricted to `scope`.
    async fn liked_restaurant_ids(
        &self,
        user: UserId,
        scope: Option<&[RestaurantId]>,
    ) -> Result<HashSet<RestaurantId>>;

    /// Single restaurant lookup.
    async fn find_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>>;

    /// Adds one to the view count of a restaurant. Returns false if it does not exist.
    async fn increment_view_count(&self, id: RestaurantId) -> Result<bool>;

    /// Whether `user` likes `restaurant`.
    async fn like_exists(&self, user: UserId, restaurant: RestaurantId) -> Result<bool>;

    /// Single review lookup.
    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>>;

    /// Opens a unit of work for review, like and aggregate writes.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// Writes that commit together.
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards
/// every write made through it.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Restaurant lookup that holds the row until the transaction ends.
    async fn find_restaurant(&mut self, id: RestaurantId) -> Result<Option<Restaurant>>;

    /// Writes the rating aggregate of one restaurant.
    async fn save_rating_aggregate(
        &mut self,
        id: RestaurantId,
        rating: RatingAggregate,
    ) -> Result<()>;

    /// Writes the like count of one restaurant.
    async fn save_like_count(&mut self, id: RestaurantId, like_count: u32) -> Result<()>;

    /// Whether `user` likes `restaurant`.
    async fn like_exists(&mut self, user: UserId, restaurant: RestaurantId) -> Result<bool>;

    /// Records that `user` likes `restaurant`.
    async fn insert_like(&mut self, user: UserId, restaurant: RestaurantId) -> Result<()>;

    /// Removes a like. Returns false if there was none.
    async fn delete_like(&mut self, user: UserId, restaurant: RestaurantId) -> Result<bool>;

    /// Review lookup that holds the row until the transaction ends.
    async fn find_review(&mut self, id: ReviewId) -> Result<Option<Review>>;

    /// Inserts a review and returns the stored row.
    async fn insert_review(
        &mut self,
        author: UserId,
        restaurant: RestaurantId,
        review: &NewReview,
    ) -> Result<Review>;

    /// Overwrites rating, content and images of a review.
    async fn update_review(&mut self, review: &Review) -> Result<()>;

    /// Deletes a review. Returns false if it did not exist.
    async fn delete_review(&mut self, id: ReviewId) -> Result<bool>;

    /// Makes every write of this transaction durable.
    async fn commit(self: Box<Self>) -> Result<()>;
}
