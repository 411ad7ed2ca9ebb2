use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized syndicated entry, ready for aggregation.
///
/// `title` and `link` are non-empty once the parser is done with an item;
/// anything that cannot satisfy that is dropped before aggregation.
/// `published` is always a valid instant, never a parse artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub source: String,
}

/// Static configuration for one upstream feed. Immutable after startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default = "default_item_limit")]
    pub item_limit: usize,
}

pub fn default_item_limit() -> usize {
    6
}

impl FeedSource {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            item_limit: default_item_limit(),
        }
    }
}

/// The outcome of one aggregation run. Built fresh on every run and never
/// mutated afterwards; a new result replaces, never patches, a cached one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    pub items: Vec<NewsItem>,
    pub generated_at: DateTime<Utc>,
    pub used_fallback: bool,
}

/// What the cache-aside store persists under its single fixed key.
/// `generated_at` is the freshness authority for the TTL check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub generated_at: DateTime<Utc>,
    pub result: AggregationResult,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) NewswireBot/1.0 Chrome/118 Safari/537.36"
                .to_string(),
            timeout_seconds: 15,
            max_retries: 2,
            retry_delay_seconds: 1,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    /// One source could not be fetched. Always absorbed by the aggregator:
    /// the source is skipped, the run continues.
    #[error("fetch {source} failed: {reason}")]
    SourceFetch { source: String, reason: String },

    /// A feed document was unusable as a whole. Item-level damage never
    /// surfaces as an error; only a document-level problem does.
    #[error("parse {source} failed: {reason}")]
    SourceParse { source: String, reason: String },

    /// Every source failed or yielded zero usable items, and the static
    /// fallback set is disabled.
    #[error("all sources failed or returned no usable items")]
    Exhausted,

    /// The refresh attempt failed and no prior cache entry exists to serve.
    /// The only condition that crosses the boundary as an error response.
    #[error("refresh failed with no cached result available: {0}")]
    NoCacheAvailable(String),

    #[error("cache store error: {0}")]
    Store(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NewsError>;
