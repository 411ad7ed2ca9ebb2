//! Static process configuration: the source list, freshness window, result
//! bound and cache key. None of it is runtime-mutable.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::Duration;
use clap::Parser;

use crate::types::{FeedSource, FetchConfig, Result};

pub const DEFAULT_CACHE_KEY: &str = "news/current/v1";
pub const DEFAULT_TTL_MINUTES: i64 = 30;
pub const DEFAULT_MAX_ITEMS: usize = 12;

#[derive(Debug, Parser)]
#[command(name = "newswire", about = "Aggregates news feeds behind a cache-aside endpoint")]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Path to a JSON file with the feed source list
    /// (array of {"name", "url", "item_limit"?})
    #[arg(long)]
    pub sources: Option<PathBuf>,

    /// Freshness window for the cached result, in minutes
    #[arg(long, default_value_t = DEFAULT_TTL_MINUTES)]
    pub cache_ttl_minutes: i64,

    /// Maximum number of items in the aggregated result
    #[arg(long, default_value_t = DEFAULT_MAX_ITEMS)]
    pub max_items: usize,

    /// Serve a hard error instead of the static placeholder set when
    /// aggregation yields nothing
    #[arg(long)]
    pub no_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub sources: Vec<FeedSource>,
    pub cache_key: String,
    pub cache_ttl: Duration,
    pub max_items: usize,
    pub fallback_enabled: bool,
    pub fetch: FetchConfig,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            max_items: DEFAULT_MAX_ITEMS,
            fallback_enabled: true,
            fetch: FetchConfig::default(),
        }
    }
}

impl NewsConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let sources = match &cli.sources {
            Some(path) => load_sources(path)?,
            None => default_sources(),
        };

        Ok(Self {
            sources,
            cache_ttl: Duration::minutes(cli.cache_ttl_minutes),
            max_items: cli.max_items,
            fallback_enabled: !cli.no_fallback,
            ..Self::default()
        })
    }
}

pub fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new("BBC News", "https://feeds.bbci.co.uk/news/rss.xml"),
        FeedSource::new("CNN", "https://rss.cnn.com/rss/edition.rss"),
        FeedSource::new("NPR", "https://feeds.npr.org/1001/rss.xml"),
    ]
}

pub fn load_sources(path: &Path) -> Result<Vec<FeedSource>> {
    let raw = fs::read_to_string(path)?;
    let sources: Vec<FeedSource> = serde_json::from_str(&raw)?;
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_file_applies_item_limit_default() {
        let raw = r#"[
            {"name": "a", "url": "https://a.example/rss"},
            {"name": "b", "url": "https://b.example/rss", "item_limit": 3}
        ]"#;
        let sources: Vec<FeedSource> = serde_json::from_str(raw).unwrap();
        assert_eq!(sources[0].item_limit, 6);
        assert_eq!(sources[1].item_limit, 3);
    }

    #[test]
    fn defaults_match_the_documented_configuration() {
        let config = NewsConfig::default();
        assert_eq!(config.cache_ttl, Duration::minutes(30));
        assert_eq!(config.max_items, 12);
        assert!(config.fallback_enabled);
        assert_eq!(config.sources.len(), 3);
    }
}
