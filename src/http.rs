//! The one inbound surface: a read endpoint for the current aggregated feed.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::aggregator::RefreshSource;
use crate::cache::{CacheStore, NewsCache, ServeOutcome};
use crate::types::NewsItem;

#[derive(Debug, Serialize)]
struct NewsPayload {
    ok: bool,
    items: Vec<NewsItem>,
    #[serde(rename = "generatedAt")]
    generated_at: DateTime<Utc>,
    fallback: bool,
}

pub fn router<S, R>(cache: Arc<NewsCache<S, R>>) -> Router
where
    S: CacheStore + 'static,
    R: RefreshSource + 'static,
{
    Router::new()
        .route("/news", get(get_news::<S, R>))
        .with_state(cache)
}

/// The freshness decision is internal, so intermediaries are told not to
/// cache; diagnostics ride on `x-news-*` headers. A stale-serve is still a
/// success to the caller, just flagged. Only a refresh failure with no prior
/// cache becomes an error response.
async fn get_news<S, R>(State(cache): State<Arc<NewsCache<S, R>>>) -> Response
where
    S: CacheStore + 'static,
    R: RefreshSource + 'static,
{
    let now = Utc::now();

    match cache.current(now).await {
        Ok(outcome) => news_response(outcome),
        Err(err) => {
            error!(error = %err, "news request failed with nothing to serve");
            let body = json!({
                "ok": false,
                "error": "news refresh failed",
                "detail": err.to_string(),
            });
            let mut response = (StatusCode::BAD_GATEWAY, Json(body)).into_response();
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            response
        }
    }
}

fn news_response(outcome: ServeOutcome) -> Response {
    let generated_at = outcome.result.generated_at;
    let fallback = outcome.result.used_fallback;
    let payload = NewsPayload {
        ok: true,
        items: outcome.result.items,
        generated_at,
        fallback,
    };

    let mut response = (StatusCode::OK, Json(payload)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        "x-news-generated-at",
        header_value(&generated_at.timestamp_millis().to_string()),
    );
    if fallback {
        headers.insert("x-news-fallback", HeaderValue::from_static("1"));
    }
    if let Some(err) = &outcome.stale_error {
        headers.insert("x-news-stale", HeaderValue::from_static("1"));
        headers.insert("x-news-error", header_value(err));
    }

    response
}

/// Error strings can carry characters a header cannot; keep the printable
/// ASCII and fall back to a marker rather than losing the response.
fn header_value(raw: &str) -> HeaderValue {
    let printable: String = raw
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect();
    HeaderValue::from_str(&printable).unwrap_or_else(|_| HeaderValue::from_static("unprintable"))
}
