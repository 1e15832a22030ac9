//! In-process relational store.
//!
//! Thread-safe via `parking_lot::RwLock`. Follows the same contracts as the
//! Postgres store, including the representative-review tie-break.
//!
//! Transactions are serialized by a writer lock and write straight into the
//! tables, keeping an undo log that is replayed if they are dropped without
//! committing. Readers outside a transaction may see its pending writes.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::aggregate::RatingAggregate;
use crate::error::{Error, Result};
use crate::model::{Menu, NewReview, Restaurant, RestaurantId, Review, ReviewId, UserId};
use crate::store::{CategoryLink, RestaurantStore, StoreTransaction};

#[derive(Default)]
struct Tables {
    restaurants: BTreeMap<RestaurantId, Restaurant>,
    menus: BTreeMap<i64, Menu>,
    categories: BTreeMap<i64, String>,
    restaurant_categories: BTreeSet<(RestaurantId, i64)>,
    likes: BTreeSet<(UserId, RestaurantId)>,
    reviews: BTreeMap<ReviewId, Review>,
    next_review_id: ReviewId,
}

/// Relational store kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a restaurant row.
    pub fn put_restaurant(&self, restaurant: Restaurant) {
        self.tables
            .write()
            .restaurants
            .insert(restaurant.id, restaurant);
    }

    /// Inserts or replaces a menu row.
    pub fn put_menu(&self, menu: Menu) {
        self.tables.write().menus.insert(menu.id, menu);
    }

    /// Inserts or renames a category.
    pub fn put_category(&self, id: i64, name: impl Into<String>) {
        self.tables.write().categories.insert(id, name.into());
    }

    /// Links a restaurant to a category.
    pub fn link_category(&self, restaurant: RestaurantId, category: i64) {
        self.tables
            .write()
            .restaurant_categories
            .insert((restaurant, category));
    }

    /// Inserts or replaces a review row as-is, bypassing aggregates.
    pub fn put_review(&self, review: Review) {
        let mut tables = self.tables.write();
        tables.next_review_id = tables.next_review_id.max(review.id);
        tables.reviews.insert(review.id, review);
    }

    /// Records a like row as-is, bypassing aggregates.
    pub fn put_like(&self, user: UserId, restaurant: RestaurantId) {
        self.tables.write().likes.insert((user, restaurant));
    }
}

fn id_set(ids: &[RestaurantId]) -> HashSet<RestaurantId> {
    ids.iter().copied().collect()
}

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn restaurants_by_ids(&self, ids: &[RestaurantId]) -> Result<Vec<Restaurant>> {
        let wanted = id_set(ids);
        let tables = self.tables.read();
        Ok(tables
            .restaurants
            .values()
            .filter(|r| wanted.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn menus_by_restaurant_ids(&self, ids: &[RestaurantId]) -> Result<Vec<Menu>> {
        let wanted = id_set(ids);
        let tables = self.tables.read();
        Ok(tables
            .menus
            .values()
            .filter(|m| wanted.contains(&m.restaurant_id))
            .cloned()
            .collect())
    }

    async fn top_reviews_by_restaurant_ids(&self, ids: &[RestaurantId]) -> Result<Vec<Review>> {
        let wanted = id_set(ids);
        let tables = self.tables.read();
        let mut best: BTreeMap<RestaurantId, &Review> = BTreeMap::new();
        // Reviews iterate in ascending ID order, so a strict comparison keeps
        // the lowest ID among equally liked reviews.
        for review in tables.reviews.values() {
            if !wanted.contains(&review.restaurant_id) {
                continue;
            }
            match best.get(&review.restaurant_id) {
                Some(current) if current.like_count >= review.like_count => {}
                _ => {
                    best.insert(review.restaurant_id, review);
                }
            }
        }
        Ok(best.into_values().cloned().collect())
    }

    async fn categories_by_restaurant_ids(
        &self,
        ids: &[RestaurantId],
    ) -> Result<Vec<CategoryLink>> {
        let wanted = id_set(ids);
        let tables = self.tables.read();
        Ok(tables
            .restaurant_categories
            .iter()
            .filter(|(restaurant, _)| wanted.contains(restaurant))
            .filter_map(|(restaurant, category)| {
                tables.categories.get(category).map(|name| CategoryLink {
                    restaurant_id: *restaurant,
                    name: name.clone(),
                })
            })
            .collect())
    }

    async fn liked_restaurant_ids(
        &self,
        user: UserId,
        scope: Option<&[RestaurantId]>,
    ) -> Result<HashSet<RestaurantId>> {
        let scope = scope.map(id_set);
        let tables = self.tables.read();
        Ok(tables
            .likes
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, restaurant)| *restaurant)
            .filter(|restaurant| scope.as_ref().is_none_or(|s| s.contains(restaurant)))
            .collect())
    }

    async fn find_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>> {
        Ok(self.tables.read().restaurants.get(&id).cloned())
    }

    async fn increment_view_count(&self, id: RestaurantId) -> Result<bool> {
        let mut tables = self.tables.write();
        Ok(match tables.restaurants.get_mut(&id) {
            Some(restaurant) => {
                restaurant.view_count += 1;
                true
            }
            None => false,
        })
    }

    async fn like_exists(&self, user: UserId, restaurant: RestaurantId) -> Result<bool> {
        Ok(self.tables.read().likes.contains(&(user, restaurant)))
    }

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>> {
        Ok(self.tables.read().reviews.get(&id).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let writer = self.writer.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            tables: self.tables.clone(),
            undo: Vec::new(),
            _writer: writer,
        }))
    }
}

/// Aggregate columns of one restaurant before a write.
struct Counters {
    id: RestaurantId,
    rating_avg: f64,
    review_count: u32,
    like_count: u32,
}

enum Undo {
    Counters(Counters),
    InsertedReview(ReviewId),
    ChangedReview(Review),
    InsertedLike(UserId, RestaurantId),
    DeletedLike(UserId, RestaurantId),
}

impl Undo {
    fn apply(self, tables: &mut Tables) {
        match self {
            Self::Counters(before) => {
                if let Some(restaurant) = tables.restaurants.get_mut(&before.id) {
                    restaurant.rating_avg = before.rating_avg;
                    restaurant.review_count = before.review_count;
                    restaurant.like_count = before.like_count;
                }
            }
            Self::InsertedReview(id) => {
                tables.reviews.remove(&id);
            }
            Self::ChangedReview(review) => {
                tables.reviews.insert(review.id, review);
            }
            Self::InsertedLike(user, restaurant) => {
                tables.likes.remove(&(user, restaurant));
            }
            Self::DeletedLike(user, restaurant) => {
                tables.likes.insert((user, restaurant));
            }
        }
    }
}

struct MemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    undo: Vec<Undo>,
    _writer: OwnedMutexGuard<()>,
}

impl MemoryTransaction {
    fn restaurant_mut<'a>(
        tables: &'a mut Tables,
        undo: &mut Vec<Undo>,
        id: RestaurantId,
    ) -> Result<&'a mut Restaurant> {
        let restaurant = tables
            .restaurants
            .get_mut(&id)
            .ok_or(Error::RestaurantNotFound(id))?;
        undo.push(Undo::Counters(Counters {
            id,
            rating_avg: restaurant.rating_avg,
            review_count: restaurant.review_count,
            like_count: restaurant.like_count,
        }));
        Ok(restaurant)
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.undo.is_empty() {
            return;
        }
        debug!(writes = self.undo.len(), "Rolling back transaction");
        let mut tables = self.tables.write();
        while let Some(undo) = self.undo.pop() {
            undo.apply(&mut tables);
        }
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_restaurant(&mut self, id: RestaurantId) -> Result<Option<Restaurant>> {
        Ok(self.tables.read().restaurants.get(&id).cloned())
    }

    async fn save_rating_aggregate(
        &mut self,
        id: RestaurantId,
        rating: RatingAggregate,
    ) -> Result<()> {
        let mut tables = self.tables.write();
        let restaurant = Self::restaurant_mut(&mut tables, &mut self.undo, id)?;
        restaurant.rating_avg = rating.rating_avg;
        restaurant.review_count = rating.review_count;
        Ok(())
    }

    async fn save_like_count(&mut self, id: RestaurantId, like_count: u32) -> Result<()> {
        let mut tables = self.tables.write();
        let restaurant = Self::restaurant_mut(&mut tables, &mut self.undo, id)?;
        restaurant.like_count = like_count;
        Ok(())
    }

    async fn like_exists(&mut self, user: UserId, restaurant: RestaurantId) -> Result<bool> {
        Ok(self.tables.read().likes.contains(&(user, restaurant)))
    }

    async fn insert_like(&mut self, user: UserId, restaurant: RestaurantId) -> Result<()> {
        if self.tables.write().likes.insert((user, restaurant)) {
            self.undo.push(Undo::InsertedLike(user, restaurant));
        }
        Ok(())
    }

    async fn delete_like(&mut self, user: UserId, restaurant: RestaurantId) -> Result<bool> {
        let removed = self.tables.write().likes.remove(&(user, restaurant));
        if removed {
            self.undo.push(Undo::DeletedLike(user, restaurant));
        }
        Ok(removed)
    }

    async fn find_review(&mut self, id: ReviewId) -> Result<Option<Review>> {
        Ok(self.tables.read().reviews.get(&id).cloned())
    }

    async fn insert_review(
        &mut self,
        author: UserId,
        restaurant: RestaurantId,
        review: &NewReview,
    ) -> Result<Review> {
        let mut tables = self.tables.write();
        tables.next_review_id += 1;
        let stored = Review {
            id: tables.next_review_id,
            user_id: author,
            restaurant_id: restaurant,
            rating: review.rating,
            content: review.content.clone(),
            like_count: 0,
            images: review.images.clone(),
        };
        tables.reviews.insert(stored.id, stored.clone());
        self.undo.push(Undo::InsertedReview(stored.id));
        Ok(stored)
    }

    async fn update_review(&mut self, review: &Review) -> Result<()> {
        let mut tables = self.tables.write();
        let stored = tables
            .reviews
            .get_mut(&review.id)
            .ok_or(Error::ReviewNotFound(review.id))?;
        self.undo.push(Undo::ChangedReview(stored.clone()));
        stored.rating = review.rating;
        stored.content = review.content.clone();
        stored.images = review.images.clone();
        Ok(())
    }

    async fn delete_review(&mut self, id: ReviewId) -> Result<bool> {
        let removed = self.tables.write().reviews.remove(&id);
        let deleted = removed.is_some();
        if let Some(review) = removed {
            self.undo.push(Undo::ChangedReview(review));
        }
        Ok(deleted)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.undo.clear();
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
