//! PostgreSQL relational store.
//!
//! Every multi-row read is a single statement keyed by `= ANY($1)`.
//! Counters are `INTEGER`/`BIGINT` columns with non-negative checks and are
//! converted to unsigned on the way out.
//!
//! Mutations run in a [`PgTransaction`]; its restaurant and review lookups
//! use `FOR UPDATE`, so concurrent mutations of one restaurant serialize on
//! the row lock.

use async_trait::async_trait;
use sqlx::postgres::{PgExecutor, PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

use crate::aggregate::RatingAggregate;
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::model::{Menu, NewReview, Restaurant, RestaurantId, Review, ReviewId, UserId};
use crate::store::{CategoryLink, RestaurantStore, StoreTransaction};

const RESTAURANT_COLUMNS: &str = "id, name, address, contact, image_url, discount_content, \
     latitude, longitude, rating_avg, review_count, naver_rating_avg, naver_review_count, \
     like_count, view_count";

const REVIEW_COLUMNS: &str = "id, user_id, restaurant_id, rating, content, like_count, images";

/// Relational store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool for the configured database.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if the database cannot be reached.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect(&config.url)
            .await?;
        info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `BackendUnavailable` if a migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| Error::backend("postgres", e.to_string()))
    }
}

fn unsigned(row: &PgRow, column: &str) -> Result<u32> {
    let value: i32 = row.try_get(column)?;
    u32::try_from(value)
        .map_err(|_| Error::MalformedState(format!("negative {column}: {value}")))
}

fn signed(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidArgument(format!("counter overflow: {value}")))
}

fn restaurant_from_row(row: &PgRow) -> Result<Restaurant> {
    let view_count: i64 = row.try_get("view_count")?;
    Ok(Restaurant {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        contact: row.try_get("contact")?,
        image_url: row.try_get("image_url")?,
        discount_content: row.try_get("discount_content")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        rating_avg: row.try_get("rating_avg")?,
        review_count: unsigned(row, "review_count")?,
        naver_rating_avg: row.try_get("naver_rating_avg")?,
        naver_review_count: unsigned(row, "naver_review_count")?,
        like_count: unsigned(row, "like_count")?,
        view_count: u64::try_from(view_count)
            .map_err(|_| Error::MalformedState(format!("negative view_count: {view_count}")))?,
    })
}

fn review_from_row(row: &PgRow) -> Result<Review> {
    Ok(Review {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        restaurant_id: row.try_get("restaurant_id")?,
        rating: row.try_get("rating")?,
        content: row.try_get("content")?,
        like_count: unsigned(row, "like_count")?,
        images: row.try_get("images")?,
    })
}

async fn fetch_restaurant<'e>(
    executor: impl PgExecutor<'e>,
    id: RestaurantId,
    lock: bool,
) -> Result<Option<Restaurant>> {
    let lock = if lock { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurant WHERE id = $1{lock}");
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    row.as_ref().map(restaurant_from_row).transpose()
}

async fn fetch_review<'e>(
    executor: impl PgExecutor<'e>,
    id: ReviewId,
    lock: bool,
) -> Result<Option<Review>> {
    let lock = if lock { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {REVIEW_COLUMNS} FROM review WHERE id = $1{lock}");
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    row.as_ref().map(review_from_row).transpose()
}

async fn fetch_like_exists<'e>(
    executor: impl PgExecutor<'e>,
    user: UserId,
    restaurant: RestaurantId,
) -> Result<bool> {
    let row = sqlx::query(
        "SELECT EXISTS (SELECT 1 FROM restaurant_like WHERE user_id = $1 AND restaurant_id = $2) AS liked",
    )
    .bind(user)
    .bind(restaurant)
    .fetch_one(executor)
    .await?;
    Ok(row.try_get("liked")?)
}

#[async_trait]
impl RestaurantStore for PgStore {
    async fn restaurants_by_ids(&self, ids: &[RestaurantId]) -> Result<Vec<Restaurant>> {
        let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurant WHERE id = ANY($1)");
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&self.pool).await?;
        rows.iter().map(restaurant_from_row).collect()
    }

    async fn menus_by_restaurant_ids(&self, ids: &[RestaurantId]) -> Result<Vec<Menu>> {
        let rows = sqlx::query(
            "SELECT id, restaurant_id, name, price, description, is_representative, image_url \
             FROM menu WHERE restaurant_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Menu {
                    id: row.try_get("id")?,
                    restaurant_id: row.try_get("restaurant_id")?,
                    name: row.try_get("name")?,
                    price: row.try_get("price")?,
                    description: row.try_get("description")?,
                    is_representative: row.try_get("is_representative")?,
                    image_url: row.try_get("image_url")?,
                })
            })
            .collect()
    }

    async fn top_reviews_by_restaurant_ids(&self, ids: &[RestaurantId]) -> Result<Vec<Review>> {
        let sql = format!(
            "SELECT DISTINCT ON (restaurant_id) {REVIEW_COLUMNS} FROM review \
             WHERE restaurant_id = ANY($1) \
             ORDER BY restaurant_id, like_count DESC, id ASC"
        );
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&self.pool).await?;
        rows.iter().map(review_from_row).collect()
    }

    async fn categories_by_restaurant_ids(
        &self,
        ids: &[RestaurantId],
    ) -> Result<Vec<CategoryLink>> {
        let rows = sqlx::query(
            "SELECT rc.restaurant_id, c.name FROM restaurant_category rc \
             JOIN category c ON c.id = rc.category_id \
             WHERE rc.restaurant_id = ANY($1) \
             ORDER BY rc.restaurant_id, c.id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CategoryLink {
                    restaurant_id: row.try_get("restaurant_id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn liked_restaurant_ids(
        &self,
        user: UserId,
        scope: Option<&[RestaurantId]>,
    ) -> Result<HashSet<RestaurantId>> {
        let rows = match scope {
            Some(ids) => {
                sqlx::query(
                    "SELECT restaurant_id FROM restaurant_like \
                     WHERE user_id = $1 AND restaurant_id = ANY($2)",
                )
                .bind(user)
                .bind(ids)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT restaurant_id FROM restaurant_like WHERE user_id = $1")
                    .bind(user)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter()
            .map(|row| row.try_get("restaurant_id").map_err(Error::from))
            .collect()
    }

    async fn find_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>> {
        fetch_restaurant(&self.pool, id, false).await
    }

    async fn increment_view_count(&self, id: RestaurantId) -> Result<bool> {
        let result = sqlx::query("UPDATE restaurant SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn like_exists(&self, user: UserId, restaurant: RestaurantId) -> Result<bool> {
        fetch_like_exists(&self.pool, user, restaurant).await
    }

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>> {
        fetch_review(&self.pool, id, false).await
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

/// Open PostgreSQL transaction. Rolled back when dropped uncommitted.
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn find_restaurant(&mut self, id: RestaurantId) -> Result<Option<Restaurant>> {
        fetch_restaurant(&mut *self.tx, id, true).await
    }

    async fn save_rating_aggregate(
        &mut self,
        id: RestaurantId,
        rating: RatingAggregate,
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE restaurant SET rating_avg = $2, review_count = $3 WHERE id = $1")
                .bind(id)
                .bind(rating.rating_avg)
                .bind(signed(rating.review_count)?)
                .execute(&mut *self.tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RestaurantNotFound(id));
        }
        Ok(())
    }

    async fn save_like_count(&mut self, id: RestaurantId, like_count: u32) -> Result<()> {
        let result = sqlx::query("UPDATE restaurant SET like_count = $2 WHERE id = $1")
            .bind(id)
            .bind(signed(like_count)?)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RestaurantNotFound(id));
        }
        Ok(())
    }

    async fn like_exists(&mut self, user: UserId, restaurant: RestaurantId) -> Result<bool> {
        fetch_like_exists(&mut *self.tx, user, restaurant).await
    }

    async fn insert_like(&mut self, user: UserId, restaurant: RestaurantId) -> Result<()> {
        sqlx::query(
            "INSERT INTO restaurant_like (user_id, restaurant_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user)
        .bind(restaurant)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_like(&mut self, user: UserId, restaurant: RestaurantId) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM restaurant_like WHERE user_id = $1 AND restaurant_id = $2")
                .bind(user)
                .bind(restaurant)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_review(&mut self, id: ReviewId) -> Result<Option<Review>> {
        fetch_review(&mut *self.tx, id, true).await
    }

    async fn insert_review(
        &mut self,
        author: UserId,
        restaurant: RestaurantId,
        review: &NewReview,
    ) -> Result<Review> {
        let sql = format!(
            "INSERT INTO review (user_id, restaurant_id, rating, content, images) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REVIEW_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(author)
            .bind(restaurant)
            .bind(review.rating)
            .bind(&review.content)
            .bind(&review.images)
            .fetch_one(&mut *self.tx)
            .await?;
        review_from_row(&row)
    }

    async fn update_review(&mut self, review: &Review) -> Result<()> {
        let result = sqlx::query(
            "UPDATE review SET rating = $2, content = $3, images = $4 WHERE id = $1",
        )
        .bind(review.id)
        .bind(review.rating)
        .bind(&review.content)
        .bind(&review.images)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::ReviewNotFound(review.id));
        }
        Ok(())
    }

    async fn delete_review(&mut self, id: ReviewId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM review WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }
}
