//! Structured boolean search queries.
//!
//! [`compile`] maps a [`crate::filter::RestaurantFilter`] onto a
//! [`SearchQuery`]; the AST serialises to Elasticsearch query DSL with
//! [`SearchQuery::to_body`].
//!
//! ## Usage
//!
//! ```rust
//! use matjip::filter::RestaurantFilter;
//! use matjip::query::compile;
//!
//! let filter = RestaurantFilter {
//!     query: Some("돈까스".to_string()),
//!     discount_for_skku: Some(true),
//!     ..Default::default()
//! };
//! let body = compile(&filter).to_body(500, 0);
//! assert_eq!(body["query"]["bool"]["minimum_should_match"], 1);
//! ```

mod builders;
mod compiler;

pub use compiler::{compile, CATEGORY_BOOST, MENU_BOOST, NAME_BOOST, ORIGINAL_CATEGORY_BOOST};

use serde_json::{json, Map, Value};

/// Field names of the restaurant search document.
pub mod fields {
    /// Restaurant name.
    pub const NAME: &str = "name";
    /// Normalised category names.
    pub const CATEGORY: &str = "category";
    /// Category names as scraped.
    pub const ORIGINAL_CATEGORY: &str = "originalCategory";
    /// Student discount text.
    pub const DISCOUNT_CONTENT: &str = "discountContent";
    /// Own rating average.
    pub const RATING_AVG: &str = "ratingAvg";
    /// Own review count.
    pub const REVIEW_COUNT: &str = "reviewCount";
    /// External rating average.
    pub const NAVER_RATING_AVG: &str = "naverRatingAvg";
    /// External review count.
    pub const NAVER_REVIEW_COUNT: &str = "naverReviewCount";
    /// Like count.
    pub const LIKE_COUNT: &str = "likeCount";
    /// Nested menu documents.
    pub const MENUS: &str = "menus";
    /// Menu name inside [`MENUS`].
    pub const MENU_NAME: &str = "menus.name";
    /// Menu description inside [`MENUS`].
    pub const MENU_DESCRIPTION: &str = "menus.description";
    /// Menu price inside [`MENUS`].
    pub const MENU_PRICE: &str = "menus.price";
}

/// A single query clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Matches every document.
    MatchAll,
    /// Field equals one of the terms.
    Terms {
        /// Field name.
        field: String,
        /// Accepted terms.
        values: Vec<String>,
    },
    /// Field is present and non-null.
    Exists {
        /// Field name.
        field: String,
    },
    /// Field is absent or null.
    Missing {
        /// Field name.
        field: String,
    },
    /// Numeric range, bounds inclusive.
    Range {
        /// Field name.
        field: String,
        /// Lower bound.
        gte: Option<Value>,
        /// Upper bound.
        lte: Option<Value>,
    },
    /// Full-text match on one field.
    Match {
        /// Field name.
        field: String,
        /// Query text.
        query: String,
        /// Score multiplier.
        boost: f32,
    },
    /// Full-text match on several fields.
    MultiMatch {
        /// Field names.
        fields: Vec<String>,
        /// Query text.
        query: String,
    },
    /// Clause evaluated against each element of a sub-document array.
    Nested {
        /// Path of the array.
        path: String,
        /// Clause applied per element.
        query: Box<Clause>,
        /// Score multiplier.
        boost: Option<f32>,
    },
    /// Compound clause.
    Bool(BoolQuery),
}

impl Clause {
    /// Serialises the clause to query DSL.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Self::Exists { field } => json!({ "exists": { "field": field } }),
            Self::Missing { field } => json!({
                "bool": { "must_not": [ { "exists": { "field": field } } ] }
            }),
            Self::Range { field, gte, lte } => {
                let mut bounds = Map::new();
                if let Some(v) = gte {
                    bounds.insert("gte".to_string(), v.clone());
                }
                if let Some(v) = lte {
                    bounds.insert("lte".to_string(), v.clone());
                }
                json!({ "range": { field.as_str(): Value::Object(bounds) } })
            }
            Self::Match {
                field,
                query,
                boost,
            } => json!({ "match": { field.as_str(): { "query": query, "boost": boost } } }),
            Self::MultiMatch { fields, query } => {
                json!({ "multi_match": { "query": query, "fields": fields } })
            }
            Self::Nested { path, query, boost } => {
                let mut nested = Map::new();
                nested.insert("path".to_string(), json!(path));
                nested.insert("query".to_string(), query.to_json());
                if let Some(b) = boost {
                    nested.insert("boost".to_string(), json!(b));
                }
                json!({ "nested": Value::Object(nested) })
            }
            Self::Bool(bool_query) => bool_query.to_json(),
        }
    }
}

/// Boolean combination of filter (non-scoring) and should (scoring) clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    /// AND-combined, do not contribute to score.
    pub filter: Vec<Clause>,
    /// OR-combined, contribute to score.
    pub should: Vec<Clause>,
    /// Minimum number of should clauses a hit must satisfy.
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    /// Returns true if the query places no constraint at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty() && self.should.is_empty()
    }

    /// Serialises to query DSL. An empty query becomes `match_all`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        if self.is_empty() {
            return Clause::MatchAll.to_json();
        }
        let mut body = Map::new();
        if !self.filter.is_empty() {
            body.insert(
                "filter".to_string(),
                Value::Array(self.filter.iter().map(Clause::to_json).collect()),
            );
        }
        if !self.should.is_empty() {
            body.insert(
                "should".to_string(),
                Value::Array(self.should.iter().map(Clause::to_json).collect()),
            );
        }
        if let Some(n) = self.minimum_should_match {
            body.insert("minimum_should_match".to_string(), json!(n));
        }
        json!({ "bool": Value::Object(body) })
    }
}

/// Descending sort on a document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Field name.
    pub field: String,
}

/// A compiled query plus its ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    /// Root boolean query.
    pub query: BoolQuery,
    /// Explicit ordering; empty means rank order.
    pub sort: Vec<SortField>,
}

impl SearchQuery {
    /// Builds the `_search` request body for a result window.
    #[must_use]
    pub fn to_body(&self, size: usize, from: usize) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.query.to_json());
        body.insert("size".to_string(), json!(size));
        body.insert("from".to_string(), json!(from));
        body.insert("track_total_hits".to_string(), json!(true));
        if !self.sort.is_empty() {
            let mut sort: Vec<Value> = self
                .sort
                .iter()
                .map(|s| json!({ s.field.as_str(): { "order": "desc" } }))
                .collect();
            sort.push(json!({ "_score": { "order": "desc" } }));
            body.insert("sort".to_string(), Value::Array(sort));
        }
        Value::Object(body)
    }
}
