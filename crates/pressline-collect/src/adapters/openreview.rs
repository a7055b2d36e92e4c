use chrono::{TimeZone, Utc};
use pressline_common::{ContentKind, DateConfidence};
use serde::Deserialize;

use crate::error::{CollectError, ParseError, ParseErrorClass};

use super::RawItem;

#[derive(Deserialize)]
struct OpenReviewResponse {
    notes: Vec<OpenReviewNote>,
}

#[derive(Deserialize)]
struct OpenReviewNote {
    id: String,
    forum: Option<String>,
    cdate: Option<i64>,
    pdate: Option<i64>,
    content: OpenReviewContent,
}

#[derive(Deserialize)]
struct OpenReviewContent {
    title: Option<OpenReviewField>,
}

/// OpenReview's API serializes note content fields either as bare strings
/// (legacy notes) or as `{"value": ...}` objects (current API v2 notes).
#[derive(Deserialize)]
#[serde(untagged)]
enum OpenReviewField {
    Bare(String),
    Wrapped { value: String },
}

impl OpenReviewField {
    fn into_string(self) -> String {
        match self {
            OpenReviewField::Bare(s) => s,
            OpenReviewField::Wrapped { value } => value,
        }
    }
}

/// Parses an OpenReview `GET /notes?...` response. `pdate` (publication
/// date) takes precedence over `cdate` (creation date, which moves when a
/// submission is revised).
pub fn parse(body: &[u8]) -> Result<Vec<RawItem>, CollectError> {
    let response: OpenReviewResponse = serde_json::from_slice(body)
        .map_err(|e| ParseError::new(ParseErrorClass::Json, format!("openreview notes parse failed: {e}")))?;

    if response.notes.is_empty() {
        return Err(ParseError::new(ParseErrorClass::NoItems, "openreview response contained zero notes").into());
    }

    let items = response
        .notes
        .into_iter()
        .map(|note| {
            let forum_id = note.forum.unwrap_or_else(|| note.id.clone());
            let url = format!("https://openreview.net/forum?id={forum_id}");
            let title = note.content.title.map(OpenReviewField::into_string).unwrap_or_default();
            let published_at = note
                .pdate
                .or(note.cdate)
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single());

            let mut raw = serde_json::Map::new();
            raw.insert("note_id".to_string(), serde_json::Value::String(note.id));
            raw.insert("forum_id".to_string(), serde_json::Value::String(forum_id));

            RawItem {
                url,
                title,
                date_confidence: if published_at.is_some() { DateConfidence::High } else { DateConfidence::Low },
                published_at,
                kind: ContentKind::Paper,
                raw: serde_json::Value::Object(raw),
            }
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"notes":[
        {"id":"abcd1234","forum":"abcd1234","cdate":1767225600000,"pdate":1767312000000,"content":{"title":{"value":"A Submission"}}}
    ]}"#;

    #[test]
    fn prefers_pdate_over_cdate() {
        let items = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "A Submission");
        assert_eq!(items[0].published_at.unwrap().timestamp_millis(), 1767312000000);
    }
}
