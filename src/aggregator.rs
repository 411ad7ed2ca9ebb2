//! Orchestrates fetching every configured source and merging the results.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::fallback;
use crate::fetcher::FeedTransport;
use crate::parser;
use crate::types::{AggregationResult, FeedSource, NewsError, Result};

/// Anything the cache layer can ask for a fresh result. Lets tests drive the
/// cache's failure paths without a network or a real aggregation run.
#[async_trait]
pub trait RefreshSource: Send + Sync {
    async fn refresh(&self, now: DateTime<Utc>) -> Result<AggregationResult>;
}

#[async_trait]
impl<T: RefreshSource + ?Sized> RefreshSource for Arc<T> {
    async fn refresh(&self, now: DateTime<Utc>) -> Result<AggregationResult> {
        (**self).refresh(now).await
    }
}

pub struct NewsAggregator {
    transport: Arc<dyn FeedTransport>,
    sources: Vec<FeedSource>,
    max_items: usize,
    fallback_enabled: bool,
}

impl NewsAggregator {
    pub fn new(
        transport: Arc<dyn FeedTransport>,
        sources: Vec<FeedSource>,
        max_items: usize,
        fallback_enabled: bool,
    ) -> Self {
        Self {
            transport,
            sources,
            max_items,
            fallback_enabled,
        }
    }

    /// Fetch and parse every source, then dedup, sort and truncate.
    ///
    /// Per-source failures are logged and skipped; one broken or slow source
    /// never fails the whole run. Duplicates collapse to the first occurrence
    /// seen during collection, keyed by link (or `source:title` when the link
    /// is empty). The surviving set is sorted newest-first (stable, so equal
    /// timestamps keep their collection order) and cut to `max_items`.
    /// An empty set becomes the static placeholder set, unless
    /// fallback is disabled, in which case the run reports exhaustion.
    pub async fn aggregate(&self, now: DateTime<Utc>) -> Result<AggregationResult> {
        let mut collected = Vec::new();
        let mut seen = HashSet::new();

        for source in &self.sources {
            match self.transport.fetch(&source.url, &source.name).await {
                Ok(raw) => {
                    if raw.trim().is_empty() {
                        let err = NewsError::SourceParse {
                            source: source.name.clone(),
                            reason: "empty document".to_string(),
                        };
                        warn!(source = %source.name, error = %err, "feed unusable, skipping source");
                        continue;
                    }
                    let items = parser::parse_feed(&raw, source, now);
                    debug!(source = %source.name, items = items.len(), "parsed feed");
                    for item in items {
                        let key = if item.link.is_empty() {
                            format!("{}:{}", source.name, item.title)
                        } else {
                            item.link.clone()
                        };
                        if !seen.insert(key) {
                            continue;
                        }
                        collected.push(item);
                    }
                }
                Err(err) => {
                    warn!(source = %source.name, error = %err, "feed failed, skipping source");
                }
            }
        }

        collected.sort_by(|a, b| b.published.cmp(&a.published));
        collected.truncate(self.max_items);

        if collected.is_empty() {
            if !self.fallback_enabled {
                return Err(NewsError::Exhausted);
            }
            info!("aggregation yielded no items, serving static fallback set");
            return Ok(AggregationResult {
                items: fallback::placeholder_items(now),
                generated_at: now,
                used_fallback: true,
            });
        }

        info!(items = collected.len(), "aggregated news items");
        Ok(AggregationResult {
            items: collected,
            generated_at: now,
            used_fallback: false,
        })
    }
}

#[async_trait]
impl RefreshSource for NewsAggregator {
    async fn refresh(&self, now: DateTime<Utc>) -> Result<AggregationResult> {
        self.aggregate(now).await
    }
}
