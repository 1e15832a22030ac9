//! Review and like commands.
//!
//! Each command opens one store transaction, validates its input, writes the
//! row, moves the restaurant aggregates through [`AggregateMaintainer`] and
//! commits. Any failure drops the transaction and leaves the store untouched.

use std::sync::Arc;
use tracing::info;

use crate::aggregate::{AggregateMaintainer, RatingAggregate};
use crate::error::{Error, Result};
use crate::model::{NewReview, Restaurant, RestaurantId, Review, ReviewId, UserId};
use crate::store::{RestaurantStore, StoreTransaction};

fn check_rating(rating: f64) -> Result<()> {
    if rating.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("rating must be finite, got {rating}")))
    }
}

async fn require_restaurant(
    tx: &mut dyn StoreTransaction,
    restaurant: RestaurantId,
) -> Result<Restaurant> {
    tx.find_restaurant(restaurant)
        .await?
        .ok_or(Error::RestaurantNotFound(restaurant))
}

/// Creates, edits and deletes reviews.
pub struct ReviewCommands {
    store: Arc<dyn RestaurantStore>,
    aggregates: AggregateMaintainer,
}

impl ReviewCommands {
    /// Creates the command service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RestaurantStore>) -> Self {
        let aggregates = AggregateMaintainer::new(store.clone());
        Self { store, aggregates }
    }

    async fn authored_review(
        tx: &mut dyn StoreTransaction,
        author: UserId,
        review_id: ReviewId,
    ) -> Result<Review> {
        let review = tx
            .find_review(review_id)
            .await?
            .ok_or(Error::ReviewNotFound(review_id))?;
        if review.user_id != author {
            return Err(Error::NotReviewAuthor {
                review_id,
                user_id: author,
            });
        }
        Ok(review)
    }

    /// Posts a review and returns it with the restaurant's new rating.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-finite rating,
    /// `RestaurantNotFound`, or a store failure.
    pub async fn create(
        &self,
        author: UserId,
        restaurant: RestaurantId,
        review: NewReview,
    ) -> Result<(Review, RatingAggregate)> {
        check_rating(review.rating)?;
        let mut tx = self.store.begin().await?;
        require_restaurant(&mut *tx, restaurant).await?;

        let stored = tx.insert_review(author, restaurant, &review).await?;
        let rating = self
            .aggregates
            .on_review_created(&mut *tx, restaurant, stored.rating)
            .await?;
        tx.commit().await?;
        info!(review = stored.id, restaurant, author, "Review created");
        Ok((stored, rating))
    }

    /// Edits a review written by `author`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument`, `ReviewNotFound`, `NotReviewAuthor`, or a
    /// store failure.
    pub async fn update(
        &self,
        author: UserId,
        review_id: ReviewId,
        rating: f64,
        content: String,
        images: Vec<String>,
    ) -> Result<Review> {
        check_rating(rating)?;
        let mut tx = self.store.begin().await?;
        let existing = Self::authored_review(&mut *tx, author, review_id).await?;
        let old_rating = existing.rating;

        let updated = Review {
            rating,
            content,
            images,
            ..existing
        };
        tx.update_review(&updated).await?;

        if old_rating != rating {
            self.aggregates
                .on_review_updated(&mut *tx, updated.restaurant_id, old_rating, rating)
                .await?;
        }
        tx.commit().await?;
        info!(review = review_id, author, "Review updated");
        Ok(updated)
    }

    /// Deletes a review written by `author`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewNotFound`, `NotReviewAuthor`, or a store failure.
    pub async fn delete(&self, author: UserId, review_id: ReviewId) -> Result<RatingAggregate> {
        let mut tx = self.store.begin().await?;
        let existing = Self::authored_review(&mut *tx, author, review_id).await?;
        if !tx.delete_review(review_id).await? {
            return Err(Error::ReviewNotFound(review_id));
        }
        let rating = self
            .aggregates
            .on_review_deleted(&mut *tx, existing.restaurant_id, existing.rating)
            .await?;
        tx.commit().await?;
        info!(review = review_id, author, "Review deleted");
        Ok(rating)
    }
}

/// Likes and unlikes restaurants.
pub struct LikeCommands {
    aggregates: AggregateMaintainer,
}

impl LikeCommands {
    /// Creates the command service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RestaurantStore>) -> Self {
        Self {
            aggregates: AggregateMaintainer::new(store),
        }
    }

    /// Marks `restaurant` as liked by `user`. Returns the like count.
    ///
    /// # Errors
    ///
    /// Returns `RestaurantNotFound` or a store failure.
    pub async fn like(&self, user: UserId, restaurant: RestaurantId) -> Result<u32> {
        self.aggregates.on_like_toggled(user, restaurant, true).await
    }

    /// Removes the like of `user` on `restaurant`. Returns the like count.
    ///
    /// # Errors
    ///
    /// Returns `RestaurantNotFound` or a store failure.
    pub async fn unlike(&self, user: UserId, restaurant: RestaurantId) -> Result<u32> {
        self.aggregates.on_like_toggled(user, restaurant, false).await
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
