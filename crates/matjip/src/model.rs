//! Domain records and the view models served to clients.

use serde::{Deserialize, Serialize};

use crate::aggregate::RatingAggregate;

/// Restaurant identifier.
pub type RestaurantId = i64;
/// User identifier.
pub type UserId = i64;
/// Review identifier.
pub type ReviewId = i64;
/// Menu identifier.
pub type MenuId = i64;

/// Canonical restaurant row.
///
/// Aggregate fields (`rating_avg`, `review_count`, `like_count`) are only
/// written by [`crate::aggregate::AggregateMaintainer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Identifier.
    pub id: RestaurantId,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Phone number or other contact.
    pub contact: String,
    /// Representative image URL.
    pub image_url: Option<String>,
    /// Student discount text, if the restaurant offers one.
    pub discount_content: Option<String>,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Average of this service's own review ratings.
    pub rating_avg: f64,
    /// Number of reviews on this service.
    pub review_count: u32,
    /// Externally sourced rating average.
    pub naver_rating_avg: f64,
    /// Externally sourced review count.
    pub naver_review_count: u32,
    /// Number of users who liked the restaurant.
    pub like_count: u32,
    /// Detail page views.
    pub view_count: u64,
}

impl Restaurant {
    /// Returns the rating aggregate of this row.
    #[must_use]
    pub fn rating(&self) -> RatingAggregate {
        RatingAggregate {
            rating_avg: self.rating_avg,
            review_count: self.review_count,
        }
    }
}

/// Menu row. Belongs to exactly one restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    /// Identifier.
    pub id: MenuId,
    /// Owning restaurant.
    pub restaurant_id: RestaurantId,
    /// Menu name.
    pub name: String,
    /// Price in won.
    pub price: i64,
    /// Free-form description.
    pub description: Option<String>,
    /// Whether this is a representative dish.
    pub is_representative: bool,
    /// Image URL.
    pub image_url: Option<String>,
}

/// Review row. References its restaurant by ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Identifier.
    pub id: ReviewId,
    /// Author.
    pub user_id: UserId,
    /// Reviewed restaurant.
    pub restaurant_id: RestaurantId,
    /// Rating value.
    pub rating: f64,
    /// Review text.
    pub content: String,
    /// Number of users who liked the review.
    pub like_count: u32,
    /// Attached image URLs.
    pub images: Vec<String>,
}

/// Review fields supplied by the author on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    /// Rating value.
    pub rating: f64,
    /// Review text.
    pub content: String,
    /// Attached image URLs.
    #[serde(default)]
    pub images: Vec<String>,
}

/// Menu as shown in a restaurant view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuView {
    /// Menu name.
    pub name: String,
    /// Price in won.
    pub price: i64,
    /// Description.
    pub description: Option<String>,
    /// Representative dish flag.
    pub is_representative: bool,
    /// Image URL.
    pub image_url: Option<String>,
}

impl From<Menu> for MenuView {
    fn from(menu: Menu) -> Self {
        Self {
            name: menu.name,
            price: menu.price,
            description: menu.description,
            is_representative: menu.is_representative,
            image_url: menu.image_url,
        }
    }
}

/// Representative review shown with a restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    /// Review identifier.
    pub id: ReviewId,
    /// Author.
    pub user_id: UserId,
    /// Rating value.
    pub rating: f64,
    /// Review text.
    pub content: String,
    /// Likes on the review.
    pub like_count: u32,
    /// Attached images.
    pub images: Vec<String>,
}

impl From<Review> for ReviewSummary {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            user_id: review.user_id,
            rating: review.rating,
            content: review.content,
            like_count: review.like_count,
            images: review.images,
        }
    }
}

/// Fully hydrated, personalized restaurant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantView {
    /// Identifier.
    pub id: RestaurantId,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Contact.
    pub contact: String,
    /// Representative image URL.
    pub image_url: Option<String>,
    /// Student discount text.
    pub discount_content: Option<String>,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Own rating average.
    pub rating_avg: f64,
    /// Own review count.
    pub review_count: u32,
    /// External rating average.
    pub naver_rating_avg: f64,
    /// External review count.
    pub naver_review_count: u32,
    /// Like count.
    pub like_count: u32,
    /// View count.
    pub view_count: u64,
    /// Category names joined through `restaurant_category`.
    pub categories: Vec<String>,
    /// Menus in storage order.
    pub menus: Vec<MenuView>,
    /// Review with the most likes.
    pub top_review: Option<ReviewSummary>,
    /// Whether the requesting user liked this restaurant.
    pub is_like: bool,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Zero-based page index.
    pub page: usize,
    /// Requested page size.
    pub size: usize,
    /// Number of items actually returned.
    pub count: usize,
    /// Total matches reported by the search index. May exceed the candidate
    /// window, in which case later pages are incomplete. For liked-only
    /// searches it is the number of liked candidates inside the window.
    pub total_hits: u64,
}

impl<T> Page<T> {
    /// Slices `items` into the requested page.
    #[must_use]
    pub fn slice(items: Vec<T>, page: usize, size: usize, total_hits: u64) -> Self {
        let start = page.saturating_mul(size);
        let content: Vec<T> = items.into_iter().skip(start).take(size).collect();
        Self {
            count: content.len(),
            content,
            page,
            size,
            total_hits,
        }
    }
}
