use chrono::{DateTime, Utc};
use pressline_common::{ContentKind, DateConfidence};
use serde::Deserialize;

use crate::error::{CollectError, ParseError, ParseErrorClass};

use super::RawItem;

#[derive(Deserialize)]
struct HfModel {
    id: String,
    #[serde(rename = "modelId")]
    model_id: Option<String>,
    #[serde(rename = "pipeline_tag")]
    pipeline_tag: Option<String>,
    downloads: Option<u64>,
    likes: Option<u64>,
    #[serde(rename = "lastModified")]
    last_modified: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    created_at: Option<DateTime<Utc>>,
}

/// Parses the HuggingFace Hub `GET /api/models?author={org}` response.
/// Prefers `createdAt` as the published date since `lastModified` changes
/// on every card edit and would otherwise make a model look freshly
/// released indefinitely.
pub fn parse(body: &[u8]) -> Result<Vec<RawItem>, CollectError> {
    let models: Vec<HfModel> = serde_json::from_slice(body)
        .map_err(|e| ParseError::new(ParseErrorClass::Json, format!("huggingface models parse failed: {e}")))?;

    if models.is_empty() {
        return Err(ParseError::new(ParseErrorClass::NoItems, "huggingface models response was empty").into());
    }

    let items = models
        .into_iter()
        .map(|m| {
            let hf_model_id = m.model_id.unwrap_or_else(|| m.id.clone());
            let url = format!("https://huggingface.co/{hf_model_id}");
            let published_at = m.created_at.or(m.last_modified);

            let mut raw = serde_json::Map::new();
            raw.insert("hf_model_id".to_string(), serde_json::Value::String(hf_model_id.clone()));
            if let Some(tag) = m.pipeline_tag {
                raw.insert("pipeline_tag".to_string(), serde_json::Value::String(tag));
            }
            if let Some(downloads) = m.downloads {
                raw.insert("downloads".to_string(), serde_json::Value::from(downloads));
            }
            if let Some(likes) = m.likes {
                raw.insert("likes".to_string(), serde_json::Value::from(likes));
            }

            RawItem {
                url,
                title: hf_model_id,
                date_confidence: if published_at.is_some() { DateConfidence::High } else { DateConfidence::Low },
                published_at,
                kind: ContentKind::Model,
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
        {"id":"acme/widget-base","modelId":"acme/widget-base","pipeline_tag":"text-generation","downloads":1200,"likes":34,"lastModified":"2026-01-05T00:00:00Z","createdAt":"2026-01-01T00:00:00Z"}
    ]"#;

    #[test]
    fn prefers_created_at_over_last_modified() {
        let items = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].published_at.unwrap().to_rfc3339(), "2026-01-01T00:00:00+00:00");
        assert_eq!(items[0].raw["hf_model_id"], "acme/widget-base");
    }
}
