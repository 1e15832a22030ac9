//! Rank-preserving hydration.
//!
//! Search returns an ordered list of IDs; the relational store returns rows
//! in whatever order it likes. The hydrator fetches every sub-resource keyed
//! by restaurant ID, then walks the input IDs once to assemble views, so the
//! output order is the input order restricted to IDs that still exist.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::likes::LikeSetResolver;
use crate::model::{Menu, MenuView, Restaurant, RestaurantId, RestaurantView, Review, UserId};
use crate::store::RestaurantStore;

/// Turns ranked restaurant IDs into personalized views.
#[derive(Clone)]
pub struct Hydrator {
    store: Arc<dyn RestaurantStore>,
    likes: LikeSetResolver,
}

impl Hydrator {
    /// Creates a hydrator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RestaurantStore>) -> Self {
        let likes = LikeSetResolver::new(store.clone());
        Self { store, likes }
    }

    /// Hydrates `ids` for `user`, keeping their order.
    ///
    /// IDs with no restaurant row are dropped. A repeated ID is hydrated
    /// once, at its first position.
    ///
    /// # Errors
    ///
    /// Returns the first store failure.
    pub async fn hydrate(
        &self,
        ids: &[RestaurantId],
        user: Option<UserId>,
    ) -> Result<Vec<RestaurantView>> {
        let mut seen = HashSet::with_capacity(ids.len());
        let order: Vec<RestaurantId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if order.is_empty() {
            return Ok(Vec::new());
        }

        let (restaurants, menus, reviews, links, liked) = tokio::try_join!(
            self.store.restaurants_by_ids(&order),
            self.store.menus_by_restaurant_ids(&order),
            self.store.top_reviews_by_restaurant_ids(&order),
            self.store.categories_by_restaurant_ids(&order),
            self.likes.membership(user, &order),
        )?;

        let mut restaurants: HashMap<RestaurantId, Restaurant> =
            restaurants.into_iter().map(|r| (r.id, r)).collect();
        let mut menus = group_menus(menus);
        let mut reviews = top_review_per_restaurant(reviews);
        let mut categories: HashMap<RestaurantId, Vec<String>> = HashMap::new();
        for link in links {
            categories.entry(link.restaurant_id).or_default().push(link.name);
        }

        let mut views = Vec::with_capacity(order.len());
        let mut stale = Vec::new();
        for id in order {
            let Some(restaurant) = restaurants.remove(&id) else {
                stale.push(id);
                continue;
            };
            views.push(RestaurantView {
                id,
                name: restaurant.name,
                address: restaurant.address,
                contact: restaurant.contact,
                image_url: restaurant.image_url,
                discount_content: restaurant.discount_content,
                latitude: restaurant.latitude,
                longitude: restaurant.longitude,
                rating_avg: restaurant.rating_avg,
                review_count: restaurant.review_count,
                naver_rating_avg: restaurant.naver_rating_avg,
                naver_review_count: restaurant.naver_review_count,
                like_count: restaurant.like_count,
                view_count: restaurant.view_count,
                categories: categories.remove(&id).unwrap_or_default(),
                menus: menus
                    .remove(&id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(MenuView::from)
                    .collect(),
                top_review: reviews.remove(&id).map(Into::into),
                is_like: liked.contains(&id),
            });
        }

        if !stale.is_empty() {
            debug!(?stale, "Dropped IDs with no restaurant row");
        }
        debug!(hydrated = views.len(), "Hydration complete");
        Ok(views)
    }
}

fn group_menus(menus: Vec<Menu>) -> HashMap<RestaurantId, Vec<Menu>> {
    let mut grouped: HashMap<RestaurantId, Vec<Menu>> = HashMap::new();
    for menu in menus {
        grouped.entry(menu.restaurant_id).or_default().push(menu);
    }
    for list in grouped.values_mut() {
        list.sort_by_key(|m| m.id);
    }
    grouped
}

/// Keeps the most liked review per restaurant, lowest ID on ties.
fn top_review_per_restaurant(reviews: Vec<Review>) -> HashMap<RestaurantId, Review> {
    let mut best: HashMap<RestaurantId, Review> = HashMap::new();
    for review in reviews {
        let replace = best.get(&review.restaurant_id).is_none_or(|current| {
            (review.like_count, std::cmp::Reverse(review.id))
                > (current.like_count, std::cmp::Reverse(current.id))
        });
        if replace {
            best.insert(review.restaurant_id, review);
        }
    }
    best
}

#[cfg(test)]
#[path = "hydrate_tests.rs"]
mod tests;
