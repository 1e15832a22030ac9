//! Tests for rank-preserving hydration.

use super::*;
use crate::error::Error;
use crate::store::MemoryStore;
use proptest::prelude::*;

fn restaurant(id: RestaurantId) -> Restaurant {
    Restaurant {
        id,
        name: format!("식당 {id}"),
        address: "수원시 장안구 율전동".to_string(),
        contact: String::new(),
        image_url: None,
        discount_content: None,
        latitude: 37.29,
        longitude: 126.97,
        rating_avg: 0.0,
        review_count: 0,
        naver_rating_avg: 0.0,
        naver_review_count: 0,
        like_count: 0,
        view_count: 0,
    }
}

fn menu(id: i64, restaurant_id: RestaurantId, name: &str) -> Menu {
    Menu {
        id,
        restaurant_id,
        name: name.to_string(),
        price: 8000,
        description: None,
        is_representative: false,
        image_url: None,
    }
}

fn review(id: i64, restaurant_id: RestaurantId, like_count: u32) -> Review {
    Review {
        id,
        user_id: 100,
        restaurant_id,
        rating: 4.0,
        content: "맛있어요".to_string(),
        like_count,
        images: vec![],
    }
}

fn seeded(ids: &[RestaurantId]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for id in ids {
        store.put_restaurant(restaurant(*id));
    }
    store
}

#[tokio::test]
async fn test_output_follows_input_order() {
    let store = seeded(&[1, 2, 3]);
    let hydrator = Hydrator::new(store);

    let views = hydrator.hydrate(&[3, 1, 2], None).await.unwrap();

    let ids: Vec<_> = views.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[tokio::test]
async fn test_stale_ids_are_dropped() {
    let store = seeded(&[1, 3]);
    let hydrator = Hydrator::new(store);

    let views = hydrator.hydrate(&[3, 2, 1], None).await.unwrap();

    let ids: Vec<_> = views.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![3, 1]);
}

#[tokio::test]
async fn test_duplicate_ids_keep_first_position() {
    let store = seeded(&[1, 2]);
    let hydrator = Hydrator::new(store);

    let views = hydrator.hydrate(&[2, 1, 2], None).await.unwrap();

    let ids: Vec<_> = views.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_empty_input() {
    let hydrator = Hydrator::new(seeded(&[1]));
    assert!(hydrator.hydrate(&[], Some(1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sub_resources_attach_to_their_restaurant() {
    // Arrange
    let store = seeded(&[1, 2]);
    store.put_menu(menu(11, 1, "제육볶음"));
    store.put_menu(menu(10, 1, "김치찌개"));
    store.put_menu(menu(20, 2, "냉면"));
    store.put_category(1, "한식");
    store.put_category(2, "찌개");
    store.link_category(1, 1);
    store.link_category(1, 2);
    store.put_review(review(5, 1, 2));
    store.put_review(review(6, 1, 9));
    store.put_like(42, 2);
    let hydrator = Hydrator::new(store);

    // Act
    let views = hydrator.hydrate(&[1, 2], Some(42)).await.unwrap();

    // Assert
    let first = &views[0];
    let menu_names: Vec<_> = first.menus.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(menu_names, vec!["김치찌개", "제육볶음"]);
    assert_eq!(first.categories, vec!["한식", "찌개"]);
    assert_eq!(first.top_review.as_ref().map(|r| r.id), Some(6));
    assert!(!first.is_like);

    let second = &views[1];
    assert_eq!(second.menus.len(), 1);
    assert!(second.categories.is_empty());
    assert!(second.top_review.is_none());
    assert!(second.is_like);
}

#[tokio::test]
async fn test_anonymous_user_likes_nothing() {
    let store = seeded(&[1]);
    store.put_like(42, 1);
    let hydrator = Hydrator::new(store);

    let views = hydrator.hydrate(&[1], None).await.unwrap();

    assert!(!views[0].is_like);
}

#[test]
fn test_top_review_tie_break_lowest_id() {
    let best = top_review_per_restaurant(vec![review(9, 1, 4), review(3, 1, 4), review(7, 1, 1)]);
    assert_eq!(best[&1].id, 3);
}

struct FailingStore;

#[async_trait::async_trait]
impl RestaurantStore for FailingStore {
    async fn restaurants_by_ids(&self, _: &[RestaurantId]) -> Result<Vec<Restaurant>> {
        Err(Error::backend("postgres", "connection refused"))
    }
    async fn menus_by_restaurant_ids(&self, _: &[RestaurantId]) -> Result<Vec<Menu>> {
        Ok(vec![])
    }
    async fn top_reviews_by_restaurant_ids(&self, _: &[RestaurantId]) -> Result<Vec<Review>> {
        Ok(vec![])
    }
    async fn categories_by_restaurant_ids(
        &self,
        _: &[RestaurantId],
    ) -> Result<Vec<crate::store::CategoryLink>> {
        Ok(vec![])
    }
    async fn liked_restaurant_ids(
        &self,
        _: UserId,
        _: Option<&[RestaurantId]>,
    ) -> Result<HashSet<RestaurantId>> {
        Ok(HashSet::new())
    }
    async fn find_restaurant(&self, _: RestaurantId) -> Result<Option<Restaurant>> {
        Ok(None)
    }
    async fn increment_view_count(&self, _: RestaurantId) -> Result<bool> {
        Ok(false)
    }
    async fn like_exists(&self, _: UserId, _: RestaurantId) -> Result<bool> {
        Ok(false)
    }
    async fn find_review(&self, _: i64) -> Result<Option<Review>> {
        Ok(None)
    }
    async fn begin(&self) -> Result<Box<dyn crate::store::StoreTransaction>> {
        Err(Error::backend("postgres", "read only"))
    }
}

#[tokio::test]
async fn test_store_failure_is_not_swallowed() {
    let hydrator = Hydrator::new(Arc::new(FailingStore));
    let err = hydrator.hydrate(&[1, 2], Some(1)).await.unwrap_err();
    assert!(err.is_transient());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: output is the input order restricted to stored IDs
    #[test]
    fn prop_hydrate_preserves_rank_order(
        stored in proptest::collection::hash_set(0i64..40, 0..20),
        input in proptest::collection::vec(0i64..40, 0..30),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let store = Arc::new(MemoryStore::new());
        for id in &stored {
            store.put_restaurant(restaurant(*id));
        }
        let hydrator = Hydrator::new(store);

        let views = runtime.block_on(hydrator.hydrate(&input, None)).unwrap();

        let mut seen = HashSet::new();
        let expected: Vec<_> = input
            .iter()
            .copied()
            .filter(|id| stored.contains(id) && seen.insert(*id))
            .collect();
        let actual: Vec<_> = views.iter().map(|v| v.id).collect();
        prop_assert_eq!(actual, expected);
    }
}
