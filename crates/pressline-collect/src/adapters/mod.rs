pub mod arxiv;
pub mod github;
pub mod html_list;
pub mod huggingface;
pub mod openreview;
pub mod rss;

use chrono::{DateTime, Utc};
use pressline_common::{ContentKind, DateConfidence};
use pressline_common::config::{SourceConfig, SourceMethod};

use crate::error::CollectError;

/// One item as produced by an adapter, before canonical-URL normalization,
/// content-hash computation, and `Item` construction (done uniformly by
/// the runner for every method).
#[derive(Debug, Clone)]
pub struct RawItem {
    pub url: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub date_confidence: DateConfidence,
    pub kind: ContentKind,
    pub raw: serde_json::Value,
}

/// Dispatches raw fetched bytes to the adapter matching the source's
/// configured collection method. Every adapter enforces `max_items` and
/// dedups within its own batch by URL before returning.
pub fn parse(
    source: &SourceConfig,
    body: &[u8],
    content_type: &str,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<RawItem>, CollectError> {
    let items = match source.method {
        SourceMethod::Rss | SourceMethod::Atom => rss::parse(body)?,
        SourceMethod::ArxivApi => arxiv::parse(body)?,
        SourceMethod::GithubReleases => github::parse(body)?,
        SourceMethod::HuggingFaceOrg => huggingface::parse(body)?,
        SourceMethod::OpenReviewNotes => openreview::parse(body)?,
        SourceMethod::HtmlList => html_list::parse(body, content_type, fetched_at)?,
    };

    Ok(dedup_and_cap(items, source.max_items as usize))
}

fn dedup_and_cap(items: Vec<RawItem>, max_items: usize) -> Vec<RawItem> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.url.clone()) {
            out.push(item);
        }
        if out.len() >= max_items {
            break;
        }
    }
    out
}
