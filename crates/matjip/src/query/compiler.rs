//! Filter-to-query compilation. Pure, no I/O.

use super::{fields, BoolQuery, Clause, SearchQuery, SortField};
use crate::filter::RestaurantFilter;

/// Boost of the restaurant name match.
pub const NAME_BOOST: f32 = 3.0;
/// Boost of the category match.
pub const CATEGORY_BOOST: f32 = 2.0;
/// Boost of the original category match.
pub const ORIGINAL_CATEGORY_BOOST: f32 = 2.0;
/// Boost of the nested menu name/description match.
pub const MENU_BOOST: f32 = 1.0;

/// Compiles a filter into a boolean search query.
#[must_use]
pub fn compile(filter: &RestaurantFilter) -> SearchQuery {
    let mut query = BoolQuery {
        filter: filter_clauses(filter),
        ..Default::default()
    };

    if let Some(text) = filter.text() {
        query.should = should_clauses(text);
        query.minimum_should_match = Some(1);
    }

    let sort = filter
        .sort
        .field()
        .map(|field| {
            vec![SortField {
                field: field.to_string(),
            }]
        })
        .unwrap_or_default();

    SearchQuery { query, sort }
}

fn filter_clauses(filter: &RestaurantFilter) -> Vec<Clause> {
    let mut clauses = Vec::new();

    if !filter.categories.is_empty() {
        clauses.push(Clause::terms(fields::CATEGORY, filter.categories.clone()));
    }

    match filter.discount_for_skku {
        Some(true) => clauses.push(Clause::exists(fields::DISCOUNT_CONTENT)),
        Some(false) => clauses.push(Clause::missing(fields::DISCOUNT_CONTENT)),
        None => {}
    }

    if let Some(min) = filter.rating_avg {
        clauses.push(Clause::gte(fields::RATING_AVG, min));
    }
    if let Some(min) = filter.review_count {
        clauses.push(Clause::gte(fields::REVIEW_COUNT, min));
    }
    if let Some(min) = filter.naver_rating_avg {
        clauses.push(Clause::gte(fields::NAVER_RATING_AVG, min));
    }
    if let Some(min) = filter.naver_review_count {
        clauses.push(Clause::gte(fields::NAVER_REVIEW_COUNT, min));
    }

    // Each bound is its own nested filter, so the two may be met by different menus.
    if let Some(max) = filter.price_max {
        clauses.push(Clause::nested(
            fields::MENUS,
            Clause::lte(fields::MENU_PRICE, max),
            None,
        ));
    }
    if let Some(min) = filter.price_min {
        clauses.push(Clause::nested(
            fields::MENUS,
            Clause::gte(fields::MENU_PRICE, min),
            None,
        ));
    }

    clauses
}

fn should_clauses(text: &str) -> Vec<Clause> {
    vec![
        Clause::matches_text(fields::NAME, text, NAME_BOOST),
        Clause::matches_text(fields::CATEGORY, text, CATEGORY_BOOST),
        Clause::matches_text(fields::ORIGINAL_CATEGORY, text, ORIGINAL_CATEGORY_BOOST),
        Clause::nested(
            fields::MENUS,
            Clause::MultiMatch {
                fields: vec![
                    fields::MENU_NAME.to_string(),
                    fields::MENU_DESCRIPTION.to_string(),
                ],
                query: text.to_string(),
            },
            Some(MENU_BOOST),
        ),
    ]
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
