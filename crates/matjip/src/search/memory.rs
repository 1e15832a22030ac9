//! In-process search backend for tests and local runs.
//!
//! Evaluates the query AST against JSON documents. Filter clauses must all
//! hold, nested clauses hold when any array element satisfies them, and the
//! score is the sum of boosts of the matching should clauses. Text matching
//! is a case-insensitive token containment check; there is no analysis or
//! relevance model beyond that. Ties keep insertion order.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::Result;
use crate::model::RestaurantId;
use crate::query::{BoolQuery, Clause, SearchQuery};
use crate::search::{Candidate, SearchBackend, SearchHits};

/// Search backend holding documents in memory.
#[derive(Default)]
pub struct MemorySearchIndex {
    docs: RwLock<Vec<(RestaurantId, Value)>>,
}

impl MemorySearchIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a document. Replacements keep their position.
    pub fn index(&self, id: RestaurantId, doc: Value) {
        let mut docs = self.docs.write();
        if let Some(slot) = docs.iter_mut().find(|(existing, _)| *existing == id) {
            slot.1 = doc;
        } else {
            docs.push((id, doc));
        }
    }

    /// Removes a document. Returns false if it was not indexed.
    pub fn remove(&self, id: RestaurantId) -> bool {
        let mut docs = self.docs.write();
        let before = docs.len();
        docs.retain(|(existing, _)| *existing != id);
        docs.len() != before
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

#[async_trait]
impl SearchBackend for MemorySearchIndex {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn search(&self, query: &SearchQuery, size: usize, from: usize) -> Result<SearchHits> {
        let docs = self.docs.read();
        let mut matched: Vec<Candidate> = docs
            .iter()
            .filter(|(_, doc)| bool_matches(&query.query, doc))
            .map(|(id, doc)| Candidate {
                id: *id,
                score: bool_score(&query.query, doc),
                source: doc.clone(),
            })
            .collect();

        // sort_by is stable, so equal keys keep insertion order.
        matched.sort_by(|a, b| {
            for sort in &query.sort {
                let ord = compare_desc(
                    get_field(&a.source, &sort.field),
                    get_field(&b.source, &sort.field),
                );
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
        });

        let total_hits = matched.len() as u64;
        let candidates = matched.into_iter().skip(from).take(size).collect();
        Ok(SearchHits {
            total_hits,
            candidates,
        })
    }
}

fn bool_matches(query: &BoolQuery, doc: &Value) -> bool {
    if !query.filter.iter().all(|c| clause_matches(c, doc)) {
        return false;
    }
    let required = query.minimum_should_match.unwrap_or(0) as usize;
    required == 0 || query.should.iter().filter(|c| clause_matches(c, doc)).count() >= required
}

fn bool_score(query: &BoolQuery, doc: &Value) -> f32 {
    if query.should.is_empty() {
        return 1.0;
    }
    query
        .should
        .iter()
        .filter(|c| clause_matches(c, doc))
        .map(clause_boost)
        .sum()
}

fn clause_boost(clause: &Clause) -> f32 {
    match clause {
        Clause::Match { boost, .. } => *boost,
        Clause::Nested { boost, .. } => boost.unwrap_or(1.0),
        _ => 1.0,
    }
}

/// Evaluates a clause against a document.
fn clause_matches(clause: &Clause, doc: &Value) -> bool {
    match clause {
        Clause::MatchAll => true,
        Clause::Terms { field, values } => get_field(doc, field)
            .is_some_and(|v| leaf_values(v).any(|leaf| values.iter().any(|t| t.as_str() == leaf))),
        Clause::Exists { field } => get_field(doc, field).is_some_and(|v| !v.is_null()),
        Clause::Missing { field } => get_field(doc, field).is_none_or(Value::is_null),
        Clause::Range { field, gte, lte } => get_field(doc, field).is_some_and(|v| {
            numbers(v).any(|n| {
                gte.as_ref()
                    .and_then(Value::as_f64)
                    .is_none_or(|min| n >= min)
                    && lte.as_ref().and_then(Value::as_f64).is_none_or(|max| n <= max)
            })
        }),
        Clause::Match { field, query, .. } => text_matches(get_field(doc, field), query),
        Clause::MultiMatch { fields, query } => fields
            .iter()
            .any(|field| text_matches(get_field(doc, field), query)),
        Clause::Nested { path, query, .. } => match get_field(doc, path) {
            Some(Value::Array(elements)) => elements.iter().any(|element| {
                let scoped = scope(path, element);
                clause_matches(query, &scoped)
            }),
            Some(element @ Value::Object(_)) => clause_matches(query, &scope(path, element)),
            _ => false,
        },
        Clause::Bool(inner) => bool_matches(inner, doc),
    }
}

/// Wraps one nested element so that `path.field` lookups resolve inside it.
fn scope(path: &str, element: &Value) -> Value {
    path.rsplit('.').fold(element.clone(), |acc, part| {
        let mut map = serde_json::Map::new();
        map.insert(part.to_string(), acc);
        Value::Object(map)
    })
}

/// Gets a field from a JSON document, supporting dot notation.
fn get_field<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    let mut current = doc;
    for part in field.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn leaf_values(value: &Value) -> Box<dyn Iterator<Item = &str> + '_> {
    match value {
        Value::String(s) => Box::new(std::iter::once(s.as_str())),
        Value::Array(items) => Box::new(items.iter().filter_map(Value::as_str)),
        _ => Box::new(std::iter::empty()),
    }
}

fn numbers(value: &Value) -> Box<dyn Iterator<Item = f64> + '_> {
    match value {
        Value::Number(n) => Box::new(n.as_f64().into_iter()),
        Value::Array(items) => Box::new(items.iter().filter_map(Value::as_f64)),
        _ => Box::new(std::iter::empty()),
    }
}

fn text_matches(value: Option<&Value>, query: &str) -> bool {
    let Some(value) = value else {
        return false;
    };
    let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    leaf_values(value).any(|text| {
        let text = text.to_lowercase();
        tokens.iter().any(|token| text.contains(token.as_str()))
    })
}

fn compare_desc(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.and_then(Value::as_f64);
    let b = b.and_then(Value::as_f64);
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
