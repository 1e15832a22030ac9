//! Matjip CLI
//!
//! Runs the search pipeline against the configured backends and prints the
//! results as JSON.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use matjip::{
    ElasticsearchBackend, MatjipConfig, RedisRestCache, RestaurantFilter, RestaurantSearchService,
    RestaurantStore, SortKey,
};

#[derive(Parser)]
#[command(name = "matjip")]
#[command(version)]
#[command(about = "Search and recommend restaurants", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", default_value = "matjip.toml", global = true)]
    config: PathBuf,

    /// Verbose output (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search restaurants
    Search(SearchArgs),

    /// Show sampled recommendations for a user
    Recommend {
        /// Requesting user
        #[arg(short, long)]
        user: Option<i64>,
    },

    /// Show one restaurant and count the view
    Detail {
        /// Restaurant ID
        #[arg(long)]
        id: i64,

        /// Requesting user
        #[arg(short, long)]
        user: Option<i64>,
    },

    /// Load and validate the configuration, then print it with secrets masked
    CheckConfig,
}

#[derive(Args)]
struct SearchArgs {
    /// Free-text query
    #[arg(short, long)]
    query: Option<String>,

    /// Category name (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Only restaurants with a student discount
    #[arg(long, conflicts_with = "no_discount")]
    discount: bool,

    /// Only restaurants without a student discount
    #[arg(long)]
    no_discount: bool,

    /// Minimum rating average
    #[arg(long)]
    rating_avg: Option<f64>,

    /// Minimum review count
    #[arg(long)]
    review_count: Option<u32>,

    /// Minimum external rating average
    #[arg(long)]
    naver_rating_avg: Option<f64>,

    /// Minimum external review count
    #[arg(long)]
    naver_review_count: Option<u32>,

    /// Some menu costs at least this much
    #[arg(long)]
    price_min: Option<i64>,

    /// Some menu costs at most this much
    #[arg(long)]
    price_max: Option<i64>,

    /// Only restaurants the user liked
    #[arg(long, requires = "user")]
    like: bool,

    /// Sort key (relevance, rating-avg, review-count, naver-rating-avg,
    /// naver-review-count, like-count)
    #[arg(long, default_value = "relevance")]
    sort: SortKey,

    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Page size
    #[arg(long, default_value_t = 20)]
    size: usize,

    /// Requesting user
    #[arg(short, long)]
    user: Option<i64>,
}

impl SearchArgs {
    fn filter(&self) -> RestaurantFilter {
        let discount_for_skku = match (self.discount, self.no_discount) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        };
        RestaurantFilter {
            query: self.query.clone(),
            categories: self.categories.clone(),
            discount_for_skku,
            rating_avg: self.rating_avg,
            review_count: self.review_count,
            naver_rating_avg: self.naver_rating_avg,
            naver_review_count: self.naver_review_count,
            price_min: self.price_min,
            price_max: self.price_max,
            like: self.like,
            sort: self.sort,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = MatjipConfig::load_from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate()?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Commands::CheckConfig = cli.command {
        print_json(&config.redacted())?;
        return Ok(());
    }

    let service = build_service(&config).await?;
    match cli.command {
        Commands::Search(args) => {
            let page = service
                .search(&args.filter(), args.page, args.size, args.user)
                .await?;
            print_json(&page)?;
        }
        Commands::Recommend { user } => {
            print_json(&service.recommend(user).await?)?;
        }
        Commands::Detail { id, user } => {
            print_json(&service.detail(id, user).await?)?;
        }
        Commands::CheckConfig => {}
    }

    Ok(())
}

async fn build_service(config: &MatjipConfig) -> anyhow::Result<RestaurantSearchService> {
    let search = Arc::new(ElasticsearchBackend::new(config.search.elasticsearch()));
    let cache = Arc::new(RedisRestCache::new(config.cache.redis()));
    let store = connect_store(config).await?;
    info!(
        search = %config.search.url,
        cache = %config.cache.url,
        "Backends configured"
    );
    Ok(RestaurantSearchService::new(search, store, cache, config))
}

#[cfg(feature = "postgres")]
async fn connect_store(config: &MatjipConfig) -> anyhow::Result<Arc<dyn RestaurantStore>> {
    let store = matjip::PgStore::connect(&config.database).await?;
    store.run_migrations().await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn connect_store(_config: &MatjipConfig) -> anyhow::Result<Arc<dyn RestaurantStore>> {
    anyhow::bail!("relational store requires --features postgres")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
