//! # Matjip
//!
//! Search-and-hydration pipeline behind a campus restaurant discovery
//! service. A multi-criteria filter is compiled into a boolean search query,
//! the search index returns ranked restaurant IDs, and the relational store
//! supplies the authoritative rows, which are assembled into personalized
//! views in exactly the ranked order.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`query`] | Filter-to-query compiler (pure) |
//! | [`search`] | Search executor and backends (Elasticsearch, in-memory) |
//! | [`store`] | Relational store (PostgreSQL, in-memory) |
//! | [`likes`] | Per-user like sets |
//! | [`hydrate`] | Rank-preserving hydration |
//! | [`aggregate`] | O(1) rating and like aggregates |
//! | [`commands`] | Review and like commands |
//! | [`recommend`] | Cached recommendation sampling |
//! | [`service`] | Search, detail and recommendation entry points |
//!
//! ## Quick Start
//!
//! ```bash
//! # Search with defaults from matjip.toml / MATJIP_* variables
//! matjip search --query 돈까스 --category 일식 --discount --size 20
//!
//! # Recommendations for user 42
//! matjip recommend --user 42
//! ```
//!
//! ## Configuration Example
//!
//! ```toml
//! [search]
//! url = "http://localhost:9200"
//! index = "restaurant"
//!
//! [database]
//! url = "postgres://localhost/matjip"
//!
//! [cache]
//! url = "http://localhost:8079"
//! key_prefix = "rec:"
//! ```

#![warn(missing_docs)]

pub mod aggregate;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod hydrate;
pub mod likes;
pub mod model;
pub mod query;
pub mod recommend;
pub mod search;
pub mod service;
pub mod store;

pub use aggregate::{AggregateMaintainer, RatingAggregate};
pub use cache::{MemoryCache, RecommendationCache, RedisRestCache};
pub use commands::{LikeCommands, ReviewCommands};
pub use config::MatjipConfig;
pub use error::{Error, Result};
pub use filter::{RestaurantFilter, SortKey};
pub use hydrate::Hydrator;
pub use likes::LikeSetResolver;
pub use model::{Page, RestaurantView};
pub use recommend::RecommendationSampler;
pub use search::{ElasticsearchBackend, MemorySearchIndex, SearchBackend, SearchExecutor};
pub use service::RestaurantSearchService;
#[cfg(feature = "postgres")]
pub use store::PgStore;
pub use store::{MemoryStore, RestaurantStore, StoreTransaction};
