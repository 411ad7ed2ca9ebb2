use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use newswire::{
    AggregationResult, CacheEntry, CacheStore, MemoryStore, NewsCache, NewsError, NewsItem,
    RefreshSource, Result,
};

const KEY: &str = "news/current/v1";

/// Counts refresh calls and can be flipped into a failing state mid-test.
struct ScriptedRefresher {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl ScriptedRefresher {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RefreshSource for ScriptedRefresher {
    async fn refresh(&self, now: DateTime<Utc>) -> Result<AggregationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(NewsError::Exhausted);
        }
        Ok(AggregationResult {
            items: vec![NewsItem {
                title: format!("refreshed at {now}"),
                link: "https://example.com/refreshed".to_string(),
                published: now,
                source: "mock".to_string(),
            }],
            generated_at: now,
            used_fallback: false,
        })
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn ttl() -> Duration {
    Duration::minutes(30)
}

fn make_cache(
    store: Arc<MemoryStore>,
    refresher: Arc<ScriptedRefresher>,
) -> NewsCache<Arc<MemoryStore>, Arc<ScriptedRefresher>> {
    NewsCache::new(store, refresher, KEY.to_string(), ttl())
}

async fn stored_entry(store: &MemoryStore) -> CacheEntry {
    let blob = store.get(KEY).await.unwrap().expect("entry should exist");
    serde_json::from_slice(&blob).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

#[tokio::test]
async fn a_fresh_entry_short_circuits_the_refresh() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let refresher = ScriptedRefresher::new();
    let cache = make_cache(store.clone(), refresher.clone());

    let first = cache.current(t0()).await.unwrap();
    assert_eq!(refresher.calls(), 1);
    assert_eq!(first.result.generated_at, t0());

    // One millisecond inside the freshness window: cached entry, unchanged.
    let inside = t0() + ttl() - Duration::milliseconds(1);
    let hit = cache.current(inside).await.unwrap();
    assert_eq!(refresher.calls(), 1, "no refresh issued on a fresh hit");
    assert_eq!(hit.result.generated_at, t0());
    assert!(!hit.is_stale());
}

#[tokio::test]
async fn an_elapsed_ttl_triggers_a_refresh_and_overwrites_the_slot() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let refresher = ScriptedRefresher::new();
    let cache = make_cache(store.clone(), refresher.clone());

    cache.current(t0()).await.unwrap();

    let past = t0() + ttl() + Duration::milliseconds(1);
    let outcome = cache.current(past).await.unwrap();

    assert_eq!(refresher.calls(), 2);
    assert_eq!(outcome.result.generated_at, past);
    assert_eq!(stored_entry(&store).await.generated_at, past, "last write wins");
}

#[tokio::test]
async fn a_failed_refresh_serves_the_stale_entry_without_restamping() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let refresher = ScriptedRefresher::new();
    let cache = make_cache(store.clone(), refresher.clone());

    let first = cache.current(t0()).await.unwrap();
    refresher.fail_from_now_on();

    let past = t0() + ttl() + Duration::minutes(5);
    let outcome = cache.current(past).await.unwrap();

    assert!(outcome.is_stale());
    assert_eq!(outcome.result.items, first.result.items);
    assert_eq!(outcome.result.generated_at, t0());
    assert!(
        outcome.stale_error.as_deref().unwrap().contains("no usable items"),
        "stale marker carries the triggering error"
    );

    let entry = stored_entry(&store).await;
    assert_eq!(entry.generated_at, t0(), "stored stamp is not updated on stale-serve");
}

#[tokio::test]
async fn a_failed_refresh_with_no_prior_entry_is_a_hard_error() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let refresher = ScriptedRefresher::new();
    refresher.fail_from_now_on();
    let cache = make_cache(store.clone(), refresher.clone());

    let err = cache.current(t0()).await.unwrap_err();
    assert!(matches!(err, NewsError::NoCacheAvailable(_)));
    assert!(store.get(KEY).await.unwrap().is_none(), "nothing was cached");
}

#[tokio::test]
async fn a_stale_slot_recovers_on_the_next_successful_refresh() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let refresher = ScriptedRefresher::new();
    let cache = make_cache(store.clone(), refresher.clone());

    cache.current(t0()).await.unwrap();
    refresher.fail_from_now_on();

    let stale_at = t0() + ttl() + Duration::minutes(1);
    assert!(cache.current(stale_at).await.unwrap().is_stale());

    refresher.failing.store(false, Ordering::SeqCst);
    let recovered_at = stale_at + Duration::minutes(1);
    let outcome = cache.current(recovered_at).await.unwrap();

    assert!(!outcome.is_stale());
    assert_eq!(outcome.result.generated_at, recovered_at);
    assert_eq!(stored_entry(&store).await.generated_at, recovered_at);
}

#[tokio::test]
async fn an_undecodable_cache_blob_reads_as_empty() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    store.put(KEY, b"not json".to_vec()).await.unwrap();

    let refresher = ScriptedRefresher::new();
    let cache = make_cache(store.clone(), refresher.clone());

    let outcome = cache.current(t0()).await.unwrap();
    assert_eq!(refresher.calls(), 1, "corrupt entry falls through to a refresh");
    assert_eq!(outcome.result.generated_at, t0());
}
