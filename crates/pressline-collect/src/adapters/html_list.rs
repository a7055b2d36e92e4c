use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use pressline_common::{ContentKind, DateConfidence};
use regex::Regex;

use crate::error::{CollectError, ParseError, ParseErrorClass};

use super::RawItem;

/// Scans a listing page's raw HTML for `<a>` tags and attempts to recover a
/// publish date for each via three layers, in order of trust, mirroring
/// how the linker prefers structured signals over free text:
///   1. a `<time datetime="...">` attribute at or near the link
///   2. a page-level `<meta property="article:published_time">`-style tag
///   3. a JSON-LD `<script type="application/ld+json">` block's `datePublished`
/// If none apply the item is kept with `date_confidence: Low` and no date,
/// rather than dropped — an undated item is still a real item.
pub fn parse(body: &[u8], content_type: &str, fetched_at: DateTime<Utc>) -> Result<Vec<RawItem>, CollectError> {
    if !is_html_or_xml(content_type) {
        return Err(CollectError::UnsupportedContentType(content_type.to_string()));
    }

    let html = std::str::from_utf8(body)
        .map_err(|e| ParseError::new(ParseErrorClass::Html, format!("body is not valid utf-8: {e}")))?;

    let page_meta_date = extract_meta_published_time(html).or_else(|| extract_json_ld_date(html));

    let links = extract_links(html);
    if links.is_empty() {
        return Err(ParseError::new(ParseErrorClass::NoItems, "no anchor tags found in html listing").into());
    }

    let items = links
        .into_iter()
        .map(|(url, title, nearby_html)| {
            let (published_at, date_confidence) = extract_time_tag(&nearby_html)
                .map(|d| (Some(d), DateConfidence::High))
                .or_else(|| page_meta_date.map(|d| (Some(d), DateConfidence::Medium)))
                .unwrap_or((None, DateConfidence::Low));

            let _ = fetched_at;

            RawItem {
                url,
                title,
                published_at,
                date_confidence,
                kind: ContentKind::News,
                raw: serde_json::Value::Null,
            }
        })
        .collect();

    Ok(items)
}

fn is_html_or_xml(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("text/html") || ct.contains("application/xhtml") || ct.contains("text/xml") || ct.contains("application/xml")
}

fn anchor_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\s+[^>]*href=["']([^"']+)["'][^>]*>(.*?)</a>"#).expect("static anchor regex is valid")
    })
}

fn time_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<time\s+[^>]*datetime=["']([^"']+)["']"#).expect("static time tag regex is valid")
    })
}

fn meta_published_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?is)<meta\s+[^>]*(?:property|name)=["'](?:article:published_time|og:article:published_time|date|dc\.date)["'][^>]*content=["']([^"']+)["']"#,
        )
        .expect("static meta regex is valid")
    })
}

fn json_ld_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""datePublished"\s*:\s*"([^"]+)""#).expect("static json-ld regex is valid"))
}

fn strip_tags(fragment: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("static tag-strip regex is valid"));
    re.replace_all(fragment, "").trim().to_string()
}

/// Returns `(url, title, surrounding_html)` for each anchor, where
/// `surrounding_html` is the anchor's own inner HTML — the only scope a
/// regex-based scan can cheaply search for a co-located `<time>` tag.
fn extract_links(html: &str) -> Vec<(String, String, String)> {
    anchor_regex()
        .captures_iter(html)
        .filter_map(|caps| {
            let url = caps.get(1)?.as_str().to_string();
            let inner = caps.get(2)?.as_str().to_string();
            let title = strip_tags(&inner);
            if title.is_empty() || url.starts_with('#') {
                return None;
            }
            Some((url, title, inner))
        })
        .collect()
}

fn extract_time_tag(fragment: &str) -> Option<DateTime<Utc>> {
    let raw = time_tag_regex().captures(fragment)?.get(1)?.as_str();
    parse_flexible_date(raw)
}

fn extract_meta_published_time(html: &str) -> Option<DateTime<Utc>> {
    let raw = meta_published_regex().captures(html)?.get(1)?.as_str();
    parse_flexible_date(raw)
}

fn extract_json_ld_date(html: &str) -> Option<DateTime<Utc>> {
    let raw = json_ld_date_regex().captures(html)?.get(1)?.as_str();
    parse_flexible_date(raw)
}

fn parse_flexible_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
    <html><head>
    <meta property="article:published_time" content="2026-01-01T00:00:00Z">
    </head><body>
    <ul>
      <li><a href="https://example.com/a">First <time datetime="2026-01-02T00:00:00Z">Jan 2</time></a></li>
      <li><a href="https://example.com/b">Second Post</a></li>
    </ul>
    </body></html>"#;

    #[test]
    fn prefers_time_tag_over_page_meta() {
        let items = parse(SAMPLE_HTML.as_bytes(), "text/html; charset=utf-8", Utc::now()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].date_confidence, DateConfidence::High);
        assert_eq!(items[1].date_confidence, DateConfidence::Medium);
    }

    #[test]
    fn rejects_non_html_content_type() {
        let err = parse(b"{}", "application/json", Utc::now()).unwrap_err();
        assert!(matches!(err, CollectError::UnsupportedContentType(_)));
    }

    #[test]
    fn no_anchors_is_a_parse_error() {
        let err = parse(b"<html><body>no links here</body></html>", "text/html", Utc::now()).unwrap_err();
        assert!(matches!(err, CollectError::Parse(ParseError { class: ParseErrorClass::NoItems, .. })));
    }
}
