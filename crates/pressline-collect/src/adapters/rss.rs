use chrono::Utc;
use pressline_common::{ContentKind, DateConfidence};

use crate::error::{CollectError, ParseError, ParseErrorClass};

use super::RawItem;

/// Parses RSS 2.0 and Atom feeds via `feed-rs`'s unified model — the
/// format distinction is handled by the parser, not by this adapter.
pub fn parse(body: &[u8]) -> Result<Vec<RawItem>, CollectError> {
    let feed = feed_rs::parser::parse(body)
        .map_err(|e| ParseError::new(ParseErrorClass::Xml, format!("feed parse failed: {e}")))?;

    if feed.entries.is_empty() {
        return Err(ParseError::new(ParseErrorClass::NoItems, "feed contained zero entries").into());
    }

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let url = entry.links.first()?.href.clone();
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let published_at = entry.published.or(entry.updated).map(|t| t.with_timezone(&Utc));
            let summary = entry.summary.map(|s| s.content);
            let authors: Vec<String> = entry.authors.iter().map(|a| a.name.clone()).collect();
            let categories: Vec<String> = entry.categories.iter().map(|c| c.term.clone()).collect();

            let mut raw = serde_json::Map::new();
            if let Some(summary) = summary {
                raw.insert("summary".to_string(), serde_json::Value::String(summary));
            }
            if !authors.is_empty() {
                raw.insert("authors".to_string(), serde_json::Value::from(authors));
            }
            if !categories.is_empty() {
                raw.insert("categories".to_string(), serde_json::Value::from(categories));
            }

            Some(RawItem {
                url,
                title,
                date_confidence: if published_at.is_some() { DateConfidence::High } else { DateConfidence::Low },
                published_at,
                kind: ContentKind::Blog,
                raw: serde_json::Value::Object(raw),
            })
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
<title>Example Feed</title>
<item>
  <title>First Post</title>
  <link>https://example.com/first</link>
  <pubDate>Mon, 01 Jan 2026 00:00:00 GMT</pubDate>
  <description>A summary.</description>
</item>
</channel></rss>"#;

    #[test]
    fn parses_rss_items_with_dates() {
        let items = parse(SAMPLE_RSS.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://example.com/first");
        assert_eq!(items[0].date_confidence, DateConfidence::High);
    }

    #[test]
    fn empty_feed_is_a_parse_error() {
        let empty = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Empty</title></channel></rss>"#;
        let err = parse(empty.as_bytes()).unwrap_err();
        assert!(matches!(err, CollectError::Parse(ParseError { class: ParseErrorClass::NoItems, .. })));
    }
}
