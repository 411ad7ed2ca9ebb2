//! Turns one raw feed document into a bounded list of normalized items.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::markup;
use crate::types::{FeedSource, NewsItem};

/// Publication-date candidates, tried in order. RSS first, then the Dublin
/// Core and Atom spellings some feeds use instead.
const DATE_TAGS: [&str; 5] = ["pubDate", "dc:date", "dc:created", "updated", "lastBuildDate"];

const LINK_TAGS: [&str; 2] = ["link", "guid"];

const UNTITLED: &str = "untitled";

/// Parse at most `source.item_limit` items out of `raw`, in document order.
///
/// Missing fields are defaulted rather than fatal: title falls back to a
/// placeholder, link to the feed's own URL, publication instant to `now`.
/// An item is dropped only when title or link is still empty after that,
/// and `source` on every surviving item is the configured feed name, never
/// anything from the document.
pub fn parse_feed(raw: &str, source: &FeedSource, now: DateTime<Utc>) -> Vec<NewsItem> {
    if !looks_like_feed(raw) {
        debug!(source = %source.name, "document has no feed markers, parsing anyway");
    }

    markup::split_items(raw)
        .into_iter()
        .take(source.item_limit)
        .filter_map(|fragment| parse_item(fragment, source, now))
        .collect()
}

fn parse_item(fragment: &str, source: &FeedSource, now: DateTime<Utc>) -> Option<NewsItem> {
    let mut title = markup::extract_tag(fragment, "title");
    if title.is_empty() {
        title = UNTITLED.to_string();
    }

    let mut link = markup::extract_first(fragment, &LINK_TAGS);
    if link.is_empty() {
        link = source.url.clone();
    }

    let published = parse_published(&markup::extract_first(fragment, &DATE_TAGS), now);

    if title.is_empty() || link.is_empty() {
        debug!(source = %source.name, "dropping item with no usable title or link");
        return None;
    }

    Some(NewsItem {
        title,
        link,
        published,
        source: source.name.clone(),
    })
}

/// Resolve a raw date string to a valid instant. Feeds mostly carry RFC 2822
/// (`pubDate`) but the Atom/Dublin Core fields are RFC 3339; anything else,
/// or nothing at all, resolves to `now` rather than an invalid timestamp.
fn parse_published(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    if raw.is_empty() {
        return now;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Cheap sniff for RSS/Atom markers, used for diagnostics only. The lenient
/// contract stands either way: a document that fails this still gets parsed.
pub fn looks_like_feed(content: &str) -> bool {
    let lower = content.to_lowercase();
    lower.contains("<rss") || lower.contains("<feed") || lower.contains("<channel")
}
