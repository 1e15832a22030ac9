//! Builder methods for creating Clause instances.

use super::Clause;
use serde_json::Value;

impl Clause {
    /// Creates a terms clause.
    #[must_use]
    pub fn terms(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::Terms {
            field: field.into(),
            values,
        }
    }

    /// Creates an exists clause.
    #[must_use]
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
        }
    }

    /// Creates a missing (not-exists) clause.
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    /// Creates a `gte` range clause.
    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Range {
            field: field.into(),
            gte: Some(value.into()),
            lte: None,
        }
    }

    /// Creates an `lte` range clause.
    #[must_use]
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Range {
            field: field.into(),
            gte: None,
            lte: Some(value.into()),
        }
    }

    /// Creates a boosted match clause.
    #[must_use]
    pub fn matches_text(field: impl Into<String>, query: impl Into<String>, boost: f32) -> Self {
        Self::Match {
            field: field.into(),
            query: query.into(),
            boost,
        }
    }

    /// Creates a nested clause.
    #[must_use]
    pub fn nested(path: impl Into<String>, query: Clause, boost: Option<f32>) -> Self {
        Self::Nested {
            path: path.into(),
            query: Box::new(query),
            boost,
        }
    }
}
