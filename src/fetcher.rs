//! Retrieval of one raw feed document from one external source.

use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::types::{FetchConfig, NewsError, Result};

const ACCEPT_FEEDS: &str = "application/rss+xml, application/xml;q=0.9, */*;q=0.8";

/// Transport seam for the aggregator. Every failure carries the source name
/// so the caller can log and skip without losing context.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch(&self, url: &str, source: &str) -> Result<String>;
}

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    async fn fetch_once(&self, url: &str, source: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_FEEDS)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsError::SourceFetch {
                source: source.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl FeedTransport for Fetcher {
    async fn fetch(&self, url: &str, source: &str) -> Result<String> {
        // Reject junk URLs up front rather than letting reqwest chew on them.
        Url::parse(url)?;

        debug!(source, url, "fetching feed");

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 8),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 30)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(url, source).await {
                Ok(body) => {
                    debug!(source, bytes = body.len(), "fetched feed");
                    return Ok(body);
                }
                Err(err) => {
                    last_error = Some(err);
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(source, attempt = attempt + 1, ?delay, "fetch failed, retrying");
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
            }
        }

        match last_error {
            Some(err @ NewsError::SourceFetch { .. }) => Err(err),
            Some(err) => Err(NewsError::SourceFetch {
                source: source.to_string(),
                reason: err.to_string(),
            }),
            None => Err(NewsError::SourceFetch {
                source: source.to_string(),
                reason: "unknown error".to_string(),
            }),
        }
    }
}
