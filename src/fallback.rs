//! Static placeholder items for when aggregation yields nothing and no cache
//! exists. Pure function of the supplied clock, no I/O, never fails.

use chrono::{DateTime, Duration, Utc};

use crate::types::NewsItem;

pub const FALLBACK_ITEM_COUNT: usize = 3;

/// Three plausible but static items, staggered a few minutes into the past
/// so they still sort sensibly next to real data, each under its own
/// distinguishing source label.
pub fn placeholder_items(now: DateTime<Utc>) -> Vec<NewsItem> {
    vec![
        NewsItem {
            title: "Live feed sources are temporarily unavailable".to_string(),
            link: "https://newswire.example/status".to_string(),
            published: now,
            source: "service notice".to_string(),
        },
        NewsItem {
            title: "How the aggregator ranks and deduplicates stories".to_string(),
            link: "https://newswire.example/docs/ranking".to_string(),
            published: now - Duration::minutes(5),
            source: "editor's desk".to_string(),
        },
        NewsItem {
            title: "Reading list: recent coverage from our archive".to_string(),
            link: "https://newswire.example/archive".to_string(),
            published: now - Duration::minutes(15),
            source: "archive".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_size_staggered_and_deterministic() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let items = placeholder_items(now);

        assert_eq!(items.len(), FALLBACK_ITEM_COUNT);
        assert_eq!(items[0].published, now);
        assert_eq!(items[1].published, now - Duration::minutes(5));
        assert_eq!(items[2].published, now - Duration::minutes(15));
        assert_eq!(items, placeholder_items(now));

        for item in &items {
            assert!(!item.title.is_empty());
            assert!(!item.link.is_empty());
            assert!(!item.source.is_empty());
        }
    }
}
