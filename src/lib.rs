pub mod aggregator;
pub mod cache;
pub mod config;
pub mod fallback;
pub mod fetcher;
pub mod http;
pub mod markup;
pub mod parser;
pub mod types;

pub use aggregator::{NewsAggregator, RefreshSource};
pub use cache::{CacheStore, MemoryStore, NewsCache, ServeOutcome};
pub use config::{Cli, NewsConfig};
pub use fetcher::{FeedTransport, Fetcher};
pub use types::*;
