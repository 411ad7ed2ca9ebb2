use std::sync::Arc;

use clap::Parser;
use newswire::{
    http, Cli, FeedTransport, Fetcher, MemoryStore, NewsAggregator, NewsCache, NewsConfig,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = NewsConfig::from_cli(&cli)?;

    info!(
        sources = config.sources.len(),
        ttl_minutes = config.cache_ttl.num_minutes(),
        max_items = config.max_items,
        "starting newswire"
    );
    for source in &config.sources {
        info!(name = %source.name, url = %source.url, limit = source.item_limit, "configured source");
    }

    let transport: Arc<dyn FeedTransport> = Arc::new(Fetcher::new(config.fetch.clone())?);
    let aggregator = NewsAggregator::new(
        transport,
        config.sources.clone(),
        config.max_items,
        config.fallback_enabled,
    );
    let cache = Arc::new(NewsCache::new(
        MemoryStore::new(),
        aggregator,
        config.cache_key.clone(),
        config.cache_ttl,
    ));

    let app = http::router(cache);
    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    info!(addr = %cli.bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
