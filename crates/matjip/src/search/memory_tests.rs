//! Tests for the in-memory search backend.

use super::*;
use crate::filter::{RestaurantFilter, SortKey};
use crate::query::compile;
use serde_json::json;

fn fixture() -> MemorySearchIndex {
    let index = MemorySearchIndex::new();
    index.index(
        1,
        json!({
            "name": "성대 돈까스",
            "category": ["일식"],
            "originalCategory": "돈가스,우동",
            "discountContent": "학생증 제시 10% 할인",
            "ratingAvg": 4.5, "reviewCount": 12, "likeCount": 3,
            "menus": [
                { "name": "등심까스", "description": "바삭한 돈까스", "price": 9000 },
                { "name": "우동", "description": null, "price": 6000 }
            ]
        }),
    );
    index.index(
        2,
        json!({
            "name": "명륜 김밥",
            "category": ["분식"],
            "originalCategory": "김밥",
            "ratingAvg": 3.9, "reviewCount": 40, "likeCount": 10,
            "menus": [
                { "name": "참치김밥", "description": "돈까스 김밥도 있음", "price": 4000 }
            ]
        }),
    );
    index.index(
        3,
        json!({
            "name": "율전 파스타",
            "category": ["양식"],
            "originalCategory": "이탈리안",
            "discountContent": null,
            "ratingAvg": 4.1, "reviewCount": 5, "likeCount": 7,
            "menus": [ { "name": "까르보나라", "description": "크림", "price": 13000 } ]
        }),
    );
    index
}

async fn run(index: &MemorySearchIndex, filter: RestaurantFilter) -> SearchHits {
    index.search(&compile(&filter), 500, 0).await.unwrap()
}

#[tokio::test]
async fn test_empty_filter_returns_everything_in_insertion_order() {
    let index = fixture();
    let hits = run(&index, RestaurantFilter::default()).await;
    assert_eq!(hits.ids(), vec![1, 2, 3]);
    assert_eq!(hits.total_hits, 3);
}

#[tokio::test]
async fn test_discount_true_never_matches_missing_field() {
    // Arrange
    let index = fixture();
    let filter = RestaurantFilter {
        discount_for_skku: Some(true),
        ..Default::default()
    };

    // Act
    let hits = run(&index, filter).await;

    // Assert: #2 lacks the field and #3 has it null
    assert_eq!(hits.ids(), vec![1]);
    for candidate in &hits.candidates {
        assert!(candidate.source.get("discountContent").is_some_and(|v| !v.is_null()));
    }
}

#[tokio::test]
async fn test_discount_false_keeps_only_missing_field() {
    let index = fixture();
    let filter = RestaurantFilter {
        discount_for_skku: Some(false),
        ..Default::default()
    };
    assert_eq!(run(&index, filter).await.ids(), vec![2, 3]);
}

#[tokio::test]
async fn test_empty_categories_match_regardless_of_category() {
    let index = fixture();
    let filter = RestaurantFilter {
        categories: vec![],
        ..Default::default()
    };
    assert_eq!(run(&index, filter).await.ids(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_category_terms() {
    let index = fixture();
    let filter = RestaurantFilter {
        categories: vec!["분식".to_string(), "양식".to_string()],
        ..Default::default()
    };
    assert_eq!(run(&index, filter).await.ids(), vec![2, 3]);
}

#[tokio::test]
async fn test_price_filter_matches_if_any_menu_fits() {
    let index = fixture();
    let filter = RestaurantFilter {
        price_max: Some(6500),
        ..Default::default()
    };
    // #1 qualifies through its 6000 udon even though its 9000 dish does not
    assert_eq!(run(&index, filter).await.ids(), vec![1, 2]);
}

#[tokio::test]
async fn test_price_bounds_may_be_met_by_different_menus() {
    // Arrange: menus at 5000 and 20000, none inside [10000, 12000]
    let index = MemorySearchIndex::new();
    index.index(
        1,
        json!({
            "name": "학식당",
            "menus": [
                { "name": "라면", "description": null, "price": 5000 },
                { "name": "코스", "description": null, "price": 20000 }
            ]
        }),
    );
    let filter = RestaurantFilter {
        price_min: Some(10000),
        price_max: Some(12000),
        ..Default::default()
    };

    // Act
    let hits = run(&index, filter).await;

    // Assert
    assert_eq!(hits.ids(), vec![1]);
}

#[tokio::test]
async fn test_price_min_and_max_each_need_some_menu() {
    let index = fixture();
    let filter = RestaurantFilter {
        price_min: Some(7000),
        price_max: Some(6500),
        ..Default::default()
    };
    // #1: 6000 meets the max, 9000 meets the min. #2 and #3 miss one bound.
    assert_eq!(run(&index, filter).await.ids(), vec![1]);
}

#[tokio::test]
async fn test_numeric_minimums() {
    let index = fixture();
    let filter = RestaurantFilter {
        rating_avg: Some(4.0),
        review_count: Some(6),
        ..Default::default()
    };
    assert_eq!(run(&index, filter).await.ids(), vec![1]);
}

#[tokio::test]
async fn test_text_query_ranks_name_above_menu_description() {
    // Arrange: #1 matches on name and menu, #2 only on a menu description
    let index = fixture();
    let filter = RestaurantFilter {
        query: Some("돈까스".to_string()),
        ..Default::default()
    };

    // Act
    let hits = run(&index, filter).await;

    // Assert
    assert_eq!(hits.ids(), vec![1, 2]);
    assert!(hits.candidates[0].score > hits.candidates[1].score);
}

#[tokio::test]
async fn test_text_query_requires_some_textual_match() {
    let index = fixture();
    let filter = RestaurantFilter {
        query: Some("마라탕".to_string()),
        ..Default::default()
    };
    assert!(run(&index, filter).await.candidates.is_empty());
}

#[tokio::test]
async fn test_sort_by_like_count() {
    let index = fixture();
    let filter = RestaurantFilter {
        sort: SortKey::LikeCount,
        ..Default::default()
    };
    assert_eq!(run(&index, filter).await.ids(), vec![2, 3, 1]);
}

#[tokio::test]
async fn test_window_and_offset() {
    let index = fixture();
    let hits = index
        .search(&compile(&RestaurantFilter::default()), 1, 1)
        .await
        .unwrap();
    assert_eq!(hits.ids(), vec![2]);
    assert_eq!(hits.total_hits, 3);
}

#[test]
fn test_reindex_keeps_position_and_remove() {
    let index = fixture();
    index.index(1, json!({ "name": "renamed" }));
    assert_eq!(index.len(), 3);
    assert!(index.remove(2));
    assert!(!index.remove(2));
    assert_eq!(index.len(), 2);
}
