use chrono::{DateTime, Utc};
use nm_core::{Error, RawFeedItem, Result};
use scraper::Html;

use crate::registry::FeedEndpoint;

pub const EXCERPT_MAX_CHARS: usize = 500;

/// Flattens an HTML snippet (RSS descriptions usually are) to plain text with
/// collapsed whitespace.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn excerpt(html: &str, max_chars: usize) -> String {
    let text = plain_text(html);
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].trim_end().to_string(),
        None => text,
    }
}

/// Parses an RSS/Atom document into items attributed to `endpoint`.
///
/// Entries without a title or a usable link are skipped; entries without a
/// date are stamped with `fetched_at`. Keeps the first `max_entries` in feed
/// order.
pub fn parse_feed(
    bytes: &[u8],
    endpoint: &FeedEndpoint,
    fetched_at: DateTime<Utc>,
    max_entries: usize,
) -> Result<Vec<RawFeedItem>> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| Error::Feed(format!("Failed to parse {}: {}", endpoint.url, e)))?;

    let items: Vec<RawFeedItem> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title.map(|t| plain_text(&t.content)).unwrap_or_default();
            if title.is_empty() {
                return None;
            }

            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;
            if link.is_empty() {
                return None;
            }

            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();

            Some(RawFeedItem {
                title,
                link,
                source: endpoint.source.clone(),
                category: endpoint.category,
                published_at: entry.published.or(entry.updated).unwrap_or(fetched_at),
                excerpt: excerpt(&description, EXCERPT_MAX_CHARS),
            })
        })
        .take(max_entries)
        .collect();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nm_core::Category;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test feed</title>
    <link>https://example.com</link>
    <description>Test</description>
    <item>
      <title>Parliament passes budget</title>
      <link>https://example.com/budget</link>
      <description>&lt;p&gt;The vote was &lt;b&gt;close&lt;/b&gt;.&lt;/p&gt;</description>
      <pubDate>Tue, 14 Oct 2025 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Undated item</title>
      <link>https://example.com/undated</link>
    </item>
    <item>
      <title></title>
      <link>https://example.com/untitled</link>
    </item>
  </channel>
</rss>"#;

    fn endpoint() -> FeedEndpoint {
        FeedEndpoint::new(Category::Politics, "example.com", "https://example.com/rss")
    }

    #[test]
    fn test_parse_feed_normalizes_entries() {
        let fetched_at = Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap();
        let items = parse_feed(RSS.as_bytes(), &endpoint(), fetched_at, 20).unwrap();
        assert_eq!(items.len(), 2);

        let undated = items.iter().find(|i| i.title == "Undated item").unwrap();
        assert_eq!(undated.published_at, fetched_at);
        assert_eq!(undated.excerpt, "");

        let budget = items.iter().find(|i| i.title == "Parliament passes budget").unwrap();
        assert_eq!(budget.excerpt, "The vote was close .");
        assert_eq!(budget.source, "example.com");
        assert_eq!(budget.category, Category::Politics);
        assert_eq!(
            budget.published_at,
            Utc.with_ymd_and_hms(2025, 10, 14, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_feed_keeps_feed_order() {
        let fetched_at = Utc.with_ymd_and_hms(2025, 10, 15, 12, 0, 0).unwrap();
        let items = parse_feed(RSS.as_bytes(), &endpoint(), fetched_at, 1).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Parliament passes budget");

        let items = parse_feed(RSS.as_bytes(), &endpoint(), fetched_at, 20).unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Parliament passes budget", "Undated item"]);
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        let result = parse_feed(b"<html>not a feed", &endpoint(), Utc::now(), 20);
        assert!(matches!(result, Err(Error::Feed(_))));
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let text = "абвгд ".repeat(200);
        let cut = excerpt(&text, 10);
        assert_eq!(cut.chars().count(), 10);
        assert_eq!(excerpt("<p>short</p>", 10), "short");
    }
}
