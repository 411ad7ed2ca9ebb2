//! Cache-aside layer over the aggregation pipeline.
//!
//! One fixed logical key holds the current aggregated feed. A request hits
//! the cache first; a fresh entry short-circuits the pipeline, anything else
//! triggers a refresh. A failed refresh serves the prior (now stale) entry
//! when one exists, annotated with the triggering error; only a failed
//! refresh with no prior entry surfaces as an error.
//!
//! Concurrent requests that both observe a stale slot may both refresh; the
//! last write wins and the write is an idempotent replacement, so no
//! single-flight coordination is attempted.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::aggregator::RefreshSource;
use crate::types::{AggregationResult, CacheEntry, NewsError, Result};

/// Backing key-value blob store. Injected so tests can use an in-memory map
/// and production can point at a shared store without touching aggregation
/// logic. Either call may fail; the caller owns all failure handling.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;
}

#[async_trait]
impl<T: CacheStore + ?Sized> CacheStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value).await
    }
}

/// Process-local store. Occupancy here is effectively O(1): the news cache
/// only ever addresses its single configured key.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.slots.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// What a request gets back: the result to serve, plus the refresh error
/// when the result is a stale entry served past its freshness window.
#[derive(Debug)]
pub struct ServeOutcome {
    pub result: AggregationResult,
    pub stale_error: Option<String>,
}

impl ServeOutcome {
    pub fn is_stale(&self) -> bool {
        self.stale_error.is_some()
    }
}

pub struct NewsCache<S, R> {
    store: S,
    source: R,
    key: String,
    ttl: Duration,
}

impl<S: CacheStore, R: RefreshSource> NewsCache<S, R> {
    pub fn new(store: S, source: R, key: String, ttl: Duration) -> Self {
        Self {
            store,
            source,
            key,
            ttl,
        }
    }

    /// The current aggregated feed, as of `now`.
    ///
    /// Slot transitions: `Empty → Fresh` on the first successful refresh,
    /// `Fresh → Stale` is pure reclassification when the TTL elapses,
    /// `Stale → Fresh` on a successful refresh, and a failed refresh leaves
    /// the stale entry in place, served but never restamped.
    pub async fn current(&self, now: DateTime<Utc>) -> Result<ServeOutcome> {
        let prior = self.load_entry().await;

        if let Some(entry) = &prior {
            if now - entry.generated_at < self.ttl {
                debug!(generated_at = %entry.generated_at, "serving fresh cache entry");
                return Ok(ServeOutcome {
                    result: entry.result.clone(),
                    stale_error: None,
                });
            }
        }

        match self.source.refresh(now).await {
            Ok(result) => {
                let entry = CacheEntry {
                    generated_at: now,
                    result: result.clone(),
                };
                // A storage hiccup must not degrade a response we already
                // computed; log it and serve the fresh result anyway.
                if let Err(err) = self.store_entry(&entry).await {
                    warn!(error = %err, "failed to store refreshed cache entry");
                }
                info!(items = result.items.len(), fallback = result.used_fallback, "cache refreshed");
                Ok(ServeOutcome {
                    result,
                    stale_error: None,
                })
            }
            Err(err) => match prior {
                Some(entry) => {
                    warn!(error = %err, generated_at = %entry.generated_at, "refresh failed, serving stale entry");
                    Ok(ServeOutcome {
                        result: entry.result,
                        stale_error: Some(err.to_string()),
                    })
                }
                None => Err(NewsError::NoCacheAvailable(err.to_string())),
            },
        }
    }

    /// A store or decode failure here reads as "no entry": the request falls
    /// through to a refresh instead of failing on a cache-layer problem.
    async fn load_entry(&self) -> Option<CacheEntry> {
        let blob = match self.store.get(&self.key).await {
            Ok(blob) => blob?,
            Err(err) => {
                warn!(error = %err, "cache read failed, treating as empty");
                return None;
            }
        };

        match serde_json::from_slice(&blob) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "cache entry is undecodable, treating as empty");
                None
            }
        }
    }

    async fn store_entry(&self, entry: &CacheEntry) -> Result<()> {
        let blob = serde_json::to_vec(entry)?;
        self.store.put(&self.key, blob).await
    }
}
