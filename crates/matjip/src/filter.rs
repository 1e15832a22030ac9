//! Restaurant search request.

use serde::{Deserialize, Serialize};

/// Multi-criteria restaurant filter. Every dimension is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestaurantFilter {
    /// Free-text query over name, categories and menus.
    pub query: Option<String>,
    /// Category names; any match passes.
    pub categories: Vec<String>,
    /// `Some(true)` keeps discounted restaurants, `Some(false)` the rest.
    pub discount_for_skku: Option<bool>,
    /// Minimum own rating average.
    pub rating_avg: Option<f64>,
    /// Minimum own review count.
    pub review_count: Option<u32>,
    /// Minimum external rating average.
    pub naver_rating_avg: Option<f64>,
    /// Minimum external review count.
    pub naver_review_count: Option<u32>,
    /// Some menu must cost at least this much.
    pub price_min: Option<i64>,
    /// Some menu must cost at most this much.
    pub price_max: Option<i64>,
    /// Restrict to restaurants the requesting user liked.
    pub like: bool,
    /// Result ordering.
    pub sort: SortKey,
}

impl RestaurantFilter {
    /// Returns the trimmed free-text query, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Search-engine rank order.
    #[default]
    Relevance,
    /// Own rating average, descending.
    RatingAvg,
    /// Own review count, descending.
    ReviewCount,
    /// External rating average, descending.
    NaverRatingAvg,
    /// External review count, descending.
    NaverReviewCount,
    /// Like count, descending.
    LikeCount,
}

impl SortKey {
    /// Index field this key orders by, `None` for relevance.
    #[must_use]
    pub fn field(self) -> Option<&'static str> {
        use crate::query::fields;
        match self {
            Self::Relevance => None,
            Self::RatingAvg => Some(fields::RATING_AVG),
            Self::ReviewCount => Some(fields::REVIEW_COUNT),
            Self::NaverRatingAvg => Some(fields::NAVER_RATING_AVG),
            Self::NaverReviewCount => Some(fields::NAVER_REVIEW_COUNT),
            Self::LikeCount => Some(fields::LIKE_COUNT),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "relevance" => Ok(Self::Relevance),
            "rating_avg" => Ok(Self::RatingAvg),
            "review_count" => Ok(Self::ReviewCount),
            "naver_rating_avg" => Ok(Self::NaverRatingAvg),
            "naver_review_count" => Ok(Self::NaverReviewCount),
            "like_count" => Ok(Self::LikeCount),
            other => Err(crate::error::Error::InvalidArgument(format!(
                "unknown sort key '{other}'"
            ))),
        }
    }
}
