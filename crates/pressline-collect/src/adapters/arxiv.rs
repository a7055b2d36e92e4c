use chrono::Utc;
use pressline_common::{ContentKind, DateConfidence};

use crate::error::{CollectError, ParseError, ParseErrorClass};

use super::RawItem;

/// Parses the arXiv export API's Atom response. Structurally identical to
/// a generic Atom feed, but every entry carries an `arxiv_id` (extracted
/// from the entry id URL, e.g. `http://arxiv.org/abs/2401.12345v2`) plus
/// primary category, which downstream ranking and linking keys off of.
pub fn parse(body: &[u8]) -> Result<Vec<RawItem>, CollectError> {
    let feed = feed_rs::parser::parse(body)
        .map_err(|e| ParseError::new(ParseErrorClass::Xml, format!("arxiv feed parse failed: {e}")))?;

    if feed.entries.is_empty() {
        return Err(ParseError::new(ParseErrorClass::NoItems, "arxiv response contained zero entries").into());
    }

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let arxiv_id = arxiv_id_from_entry_id(&entry.id)?;
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_else(|| format!("https://arxiv.org/abs/{arxiv_id}"));
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let published_at = entry.published.or(entry.updated).map(|t| t.with_timezone(&Utc));
            let summary = entry.summary.map(|s| s.content);
            let authors: Vec<String> = entry.authors.iter().map(|a| a.name.clone()).collect();
            let category = entry.categories.first().map(|c| c.term.clone());

            let mut raw = serde_json::Map::new();
            raw.insert("arxiv_id".to_string(), serde_json::Value::String(arxiv_id));
            if let Some(summary) = summary {
                raw.insert("summary".to_string(), serde_json::Value::String(summary));
            }
            if !authors.is_empty() {
                raw.insert("authors".to_string(), serde_json::Value::from(authors));
            }
            if let Some(category) = category {
                raw.insert("primary_category".to_string(), serde_json::Value::String(category));
            }

            Some(RawItem {
                url,
                title,
                date_confidence: if published_at.is_some() { DateConfidence::High } else { DateConfidence::Low },
                published_at,
                kind: ContentKind::Paper,
                raw: serde_json::Value::Object(raw),
            })
        })
        .collect();

    Ok(items)
}

fn arxiv_id_from_entry_id(entry_id: &str) -> Option<String> {
    let stripped = entry_id.rsplit('/').next()?;
    Some(strip_version_suffix(stripped.trim_start_matches("abs:")))
}

/// Drops a trailing `v<N>` version suffix (`2401.12345v2` -> `2401.12345`)
/// so an arXiv-API item groups with the same paper seen via RSS or another
/// source, which never carries the version suffix.
fn strip_version_suffix(id: &str) -> String {
    match id.rfind('v') {
        Some(pos) if pos > 0 && !id[pos + 1..].is_empty() && id[pos + 1..].bytes().all(|b| b.is_ascii_digit()) => id[..pos].to_string(),
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ARXIV: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
<entry>
  <id>http://arxiv.org/abs/2401.12345v2</id>
  <title>A Paper About Things</title>
  <published>2026-01-01T00:00:00Z</published>
  <link href="http://arxiv.org/abs/2401.12345v2"/>
  <category term="cs.LG"/>
</entry>
</feed>"#;

    #[test]
    fn extracts_arxiv_id_and_category() {
        let items = parse(SAMPLE_ARXIV.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].raw["arxiv_id"], "2401.12345");
        assert_eq!(items[0].raw["primary_category"], "cs.LG");
        assert_eq!(items[0].kind, ContentKind::Paper);
    }

    #[test]
    fn strips_version_suffix_so_ids_match_across_sources() {
        assert_eq!(strip_version_suffix("2401.12345v2"), "2401.12345");
        assert_eq!(strip_version_suffix("2401.12345v10"), "2401.12345");
        assert_eq!(strip_version_suffix("2401.12345"), "2401.12345");
    }
}
