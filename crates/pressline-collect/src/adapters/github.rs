use chrono::{DateTime, Utc};
use pressline_common::{ContentKind, DateConfidence};
use serde::Deserialize;

use crate::error::{CollectError, ParseError, ParseErrorClass};

use super::RawItem;

#[derive(Deserialize)]
struct GithubRelease {
    html_url: String,
    tag_name: String,
    name: Option<String>,
    published_at: Option<DateTime<Utc>>,
    draft: bool,
    prerelease: bool,
    body: Option<String>,
}

/// Parses the GitHub REST `GET /repos/{owner}/{repo}/releases` response.
/// Draft releases are dropped; everything else (including prereleases) is
/// kept, matching the GitHub UI's own release feed.
pub fn parse(body: &[u8]) -> Result<Vec<RawItem>, CollectError> {
    let releases: Vec<GithubRelease> = serde_json::from_slice(body)
        .map_err(|e| ParseError::new(ParseErrorClass::Json, format!("github releases parse failed: {e}")))?;

    if releases.is_empty() {
        return Err(ParseError::new(ParseErrorClass::NoItems, "github releases response was empty").into());
    }

    let items = releases
        .into_iter()
        .filter(|r| !r.draft)
        .map(|r| {
            let title = r.name.filter(|n| !n.is_empty()).unwrap_or_else(|| r.tag_name.clone());

            let mut raw = serde_json::Map::new();
            raw.insert("tag_name".to_string(), serde_json::Value::String(r.tag_name));
            raw.insert("prerelease".to_string(), serde_json::Value::Bool(r.prerelease));
            if let Some(body) = r.body {
                raw.insert("body".to_string(), serde_json::Value::String(body));
            }

            RawItem {
                url: r.html_url,
                title,
                date_confidence: if r.published_at.is_some() { DateConfidence::High } else { DateConfidence::Low },
                published_at: r.published_at,
                kind: ContentKind::Release,
                raw: serde_json::Value::Object(raw),
            }
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"html_url":"https://github.com/acme/widget/releases/tag/v1.0","tag_name":"v1.0","name":"v1.0","published_at":"2026-01-01T00:00:00Z","draft":false,"prerelease":false,"body":"notes"},
        {"html_url":"https://github.com/acme/widget/releases/tag/v1.1-draft","tag_name":"v1.1-draft","name":null,"published_at":null,"draft":true,"prerelease":false,"body":null}
    ]"#;

    #[test]
    fn drops_draft_releases() {
        let items = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "v1.0");
    }
}
