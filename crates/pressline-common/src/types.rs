use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Source authority tier. 0 is highest authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct Tier(pub u8);

impl Tier {
    pub fn new(value: u8) -> Result<Self, String> {
        if value > 2 {
            return Err(format!("tier must be 0, 1, or 2, got {value}"));
        }
        Ok(Self(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Blog,
    Paper,
    Release,
    News,
    Model,
    Dataset,
    Docs,
    Forum,
    Social,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ContentKind::Blog => "blog",
            ContentKind::Paper => "paper",
            ContentKind::Release => "release",
            ContentKind::News => "news",
            ContentKind::Model => "model",
            ContentKind::Dataset => "dataset",
            ContentKind::Docs => "docs",
            ContentKind::Forum => "forum",
            ContentKind::Social => "social",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blog" => Ok(Self::Blog),
            "paper" => Ok(Self::Paper),
            "release" => Ok(Self::Release),
            "news" => Ok(Self::News),
            "model" => Ok(Self::Model),
            "dataset" => Ok(Self::Dataset),
            "docs" => Ok(Self::Docs),
            "forum" => Ok(Self::Forum),
            "social" => Ok(Self::Social),
            other => Err(format!("unknown content kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DateConfidence {
    High,
    Medium,
    Low,
}

/// A collected item, keyed by its canonical URL.
///
/// Invariants: `url` is canonicalized (scheme+host normalized, tracking
/// query parameters stripped) before this item is constructed; `content_hash`
/// is a deterministic function of the canonical fields (see
/// [`crate::hash::content_hash`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub url: String,
    pub source_id: String,
    pub tier: u8,
    pub kind: ContentKind,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub date_confidence: DateConfidence,
    pub content_hash: String,
    /// Source-specific fields, JSON-encoded verbatim as collected.
    pub raw_json: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Item {
    /// Parse `raw_json` into a generic JSON value, tolerating malformed or
    /// empty payloads the way `Story::_parse_raw_json` does upstream.
    pub fn raw_value(&self) -> serde_json::Value {
        if self.raw_json.is_empty() {
            return serde_json::Value::Null;
        }
        serde_json::from_str(&self.raw_json).unwrap_or(serde_json::Value::Null)
    }
}

/// Per-source conditional-request cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpCacheEntry {
    pub source_id: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_status: Option<i64>,
    pub last_fetch_at: DateTime<Utc>,
}

/// Tri-state success outcome for a [`RunRecord`]. `None` while the run is
/// still in flight.
pub type RunSuccess = Option<bool>;

/// Lifecycle record for one pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub success: RunSuccess,
    pub error_summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Official,
    Arxiv,
    Github,
    Huggingface,
    Paper,
    Code,
    Model,
    Demo,
    Blog,
    News,
    Video,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Official => "official",
            LinkType::Arxiv => "arxiv",
            LinkType::Github => "github",
            LinkType::Huggingface => "huggingface",
            LinkType::Paper => "paper",
            LinkType::Code => "code",
            LinkType::Model => "model",
            LinkType::Demo => "demo",
            LinkType::Blog => "blog",
            LinkType::News => "news",
            LinkType::Video => "video",
        }
    }
}

/// One typed reference inside a [`Story`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryLink {
    pub url: String,
    pub link_type: LinkType,
    pub source_id: String,
    pub tier: u8,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StorySection {
    Top5,
    ModelReleases,
    Papers,
    Radar,
}

impl StorySection {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorySection::Top5 => "top5",
            StorySection::ModelReleases => "model_releases",
            StorySection::Papers => "papers",
            StorySection::Radar => "radar",
        }
    }
}

/// A set of items judged to refer to the same underlying artifact.
///
/// Invariants: `primary_link` is one of `links`; `links` is never empty;
/// `story_id` is deterministic from its stable IDs, or from a hash of the
/// canonical fallback key when none are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub story_id: String,
    pub title: String,
    pub primary_link: StoryLink,
    pub links: Vec<StoryLink>,
    pub entities: Vec<String>,
    pub section: Option<StorySection>,
    pub published_at: Option<DateTime<Utc>>,
    pub arxiv_id: Option<String>,
    pub hf_model_id: Option<String>,
    pub github_release_url: Option<String>,
    pub item_count: u32,
    pub raw_items: Vec<Item>,
}

impl Story {
    /// Metadata folded together from `raw_items`: authors, summary,
    /// categories, source name, earliest `first_seen_at`, and (when present)
    /// HuggingFace-specific fields. Mirrors the upstream
    /// `Story._extract_metadata_from_raw_items` precedence: the first
    /// non-empty value found (in `raw_items` order) wins for each field.
    pub fn extracted_metadata(&self) -> StoryMetadata {
        let mut meta = StoryMetadata::default();
        for item in &self.raw_items {
            let raw = item.raw_value();
            let Some(obj) = raw.as_object() else {
                continue;
            };

            if meta.first_seen_at.is_none_or(|ts| item.first_seen_at < ts) {
                meta.first_seen_at = Some(item.first_seen_at);
            }

            if meta.authors.is_empty() {
                if let Some(authors) = obj.get("authors").and_then(|v| v.as_array()) {
                    meta.authors = authors
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect();
                } else if let Some(author) = obj.get("author").and_then(|v| v.as_str()) {
                    meta.authors = vec![author.to_string()];
                }
            }

            if meta.summary.is_none() {
                meta.summary = obj
                    .get("readme_summary")
                    .and_then(|v| v.as_str())
                    .or_else(|| obj.get("abstract_snippet").and_then(|v| v.as_str()))
                    .or_else(|| obj.get("summary").and_then(|v| v.as_str()))
                    .map(str::to_string);
            }

            if meta.categories.is_empty() {
                if let Some(cat) = obj.get("feed_category").and_then(|v| v.as_str()) {
                    meta.categories = vec![cat.to_string()];
                } else if let Some(cats) = obj.get("categories").and_then(|v| v.as_array()) {
                    meta.categories = cats
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect();
                }
            }

            if meta.source_name.is_none() {
                meta.source_name = obj.get("source_name").and_then(|v| v.as_str()).map(str::to_string);
            }

            if meta.hf_metadata.is_none() && obj.get("platform").and_then(|v| v.as_str()) == Some("huggingface") {
                let mut hf = serde_json::Map::new();
                for key in ["pipeline_tag", "license"] {
                    if let Some(v) = obj.get(key).and_then(|v| v.as_str()) {
                        hf.insert(key.to_string(), serde_json::Value::String(v.to_string()));
                    }
                }
                for key in ["downloads", "likes"] {
                    if let Some(v) = obj.get(key).and_then(|v| v.as_i64()) {
                        hf.insert(key.to_string(), serde_json::Value::from(v));
                    }
                }
                if !hf.is_empty() {
                    meta.hf_metadata = Some(serde_json::Value::Object(hf));
                }
            }
        }
        meta
    }

    /// The JSON-serializable shape written into `api/daily.json` for this
    /// story: the story's own fields plus the metadata folded from its
    /// `raw_items`, but never the raw items themselves.
    pub fn to_json_value(&self) -> serde_json::Value {
        let meta = self.extracted_metadata();
        let link_value = |link: &StoryLink| {
            serde_json::json!({
                "url": link.url,
                "link_type": link.link_type,
                "source_id": link.source_id,
                "tier": link.tier,
                "title": link.title,
            })
        };

        serde_json::json!({
            "story_id": self.story_id,
            "title": self.title,
            "primary_link": link_value(&self.primary_link),
            "links": self.links.iter().map(link_value).collect::<Vec<_>>(),
            "entities": self.entities,
            "section": self.section.map(|s| s.as_str()),
            "published_at": self.published_at.map(|ts| ts.to_rfc3339()),
            "arxiv_id": self.arxiv_id,
            "hf_model_id": self.hf_model_id,
            "github_release_url": self.github_release_url,
            "item_count": self.item_count,
            "authors": meta.authors,
            "summary": meta.summary,
            "categories": meta.categories,
            "source_name": meta.source_name,
            "first_seen_at": meta.first_seen_at.map(|ts| ts.to_rfc3339()),
            "hf_metadata": meta.hf_metadata,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoryMetadata {
    pub authors: Vec<String>,
    pub summary: Option<String>,
    pub categories: Vec<String>,
    pub source_name: Option<String>,
    pub first_seen_at: Option<DateTime<Utc>>,
    pub hf_metadata: Option<serde_json::Value>,
}

/// Per-component contributions to a [`ScoredStory`]'s total score.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub tier_score: f64,
    pub kind_score: f64,
    pub topic_score: f64,
    pub recency_score: f64,
    pub entity_score: f64,
    pub citation_score: f64,
    pub cross_source_score: f64,
    pub semantic_score: f64,
    pub llm_relevance_score: f64,
    pub total_score: f64,
}

/// A [`Story`] annotated with score components and, once quota filtering has
/// run, a section assignment or a drop reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredStory {
    pub story: Story,
    pub components: ScoreComponents,
    pub assigned_section: Option<StorySection>,
    pub dropped: bool,
    pub drop_reason: Option<String>,
}

impl ScoredStory {
    pub fn new(story: Story, components: ScoreComponents) -> Self {
        Self {
            story,
            components,
            assigned_section: None,
            dropped: false,
            drop_reason: None,
        }
    }
}

/// Audit record for a story removed by quota filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedEntry {
    pub story_id: String,
    pub source_id: String,
    pub score: f64,
    pub drop_reason: String,
    pub arxiv_category: Option<String>,
}

/// The final ordered result of the ranker stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerOutput {
    pub top5: Vec<ScoredStory>,
    pub model_releases_by_entity: std::collections::BTreeMap<String, Vec<ScoredStory>>,
    pub papers: Vec<ScoredStory>,
    pub radar: Vec<ScoredStory>,
    pub checksum_sha256: String,
}

/// Per-source status as rendered into `sources_status`. The reason code
/// itself (a closed enum) lives in `pressline-status`; this carries the
/// rendering-facing shape so `pressline-render` doesn't need to depend on
/// `pressline-status` just for a data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceStatusCode {
    NoUpdate,
    HasUpdate,
    FetchFailed,
    ParseFailed,
    StatusOnly,
    CannotConfirm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source_id: String,
    pub name: String,
    pub tier: u8,
    pub method: String,
    pub status: SourceStatusCode,
    pub reason_code: String,
    pub reason_text: String,
    pub remediation_hint: Option<String>,
    pub newest_item_date: Option<DateTime<Utc>>,
    pub last_fetch_status_code: Option<u16>,
    pub items_new: u32,
    pub items_updated: u32,
    pub category: Option<String>,
}

/// Rendering-facing view of a run, distinct from the persisted
/// [`RunRecord`]: adds the item/story totals the digest displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub success: RunSuccess,
    pub error_summary: Option<String>,
    pub items_total: u32,
    pub stories_total: u32,
}
