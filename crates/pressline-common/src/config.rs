//! Shapes consumed by the pipeline. Parsing these from YAML and reporting
//! schema validation errors is an external collaborator's job (spec.md §1,
//! §6); these constructors only enforce the field bounds the schema would
//! have enforced, so any caller assembling one of these gets the same
//! invariants regardless of how it was parsed.

use std::collections::HashMap;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMethod {
    Rss,
    Atom,
    ArxivApi,
    GithubReleases,
    HuggingFaceOrg,
    OpenReviewNotes,
    HtmlList,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub id: String,
    pub name: String,
    pub url: String,
    pub tier: u8,
    pub method: SourceMethod,
    pub kind: String,
    pub timezone: String,
    pub max_items: u32,
    pub enabled: bool,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
}

const FORBIDDEN_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key"];

impl SourceConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        tier: u8,
        method: SourceMethod,
        kind: impl Into<String>,
        timezone: impl Into<String>,
        max_items: u32,
        enabled: bool,
        query: Option<String>,
        headers: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        if tier > 2 {
            return Err(ConfigError::OutOfBounds {
                field: "sources[].tier".into(),
                detail: format!("must be 0, 1, or 2, got {tier}"),
            });
        }
        if max_items > 1000 {
            return Err(ConfigError::OutOfBounds {
                field: "sources[].max_items".into(),
                detail: format!("must be <= 1000, got {max_items}"),
            });
        }
        for key in headers.keys() {
            if FORBIDDEN_HEADERS.contains(&key.to_lowercase().as_str()) {
                return Err(ConfigError::ForbiddenHeader {
                    source_id: id.into(),
                    header: key.clone(),
                });
            }
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            tier,
            method,
            kind: kind.into(),
            timezone: timezone.into(),
            max_items,
            enabled,
            query,
            headers,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Cn,
    Intl,
}

#[derive(Debug, Clone)]
pub struct EntityConfig {
    pub id: String,
    pub name: String,
    pub region: Region,
    pub keywords: Vec<String>,
    pub prefer_links: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TopicConfig {
    pub name: String,
    pub keywords: Vec<String>,
    pub boost_weight: f64,
    pub prefer_primary_link_order: Vec<String>,
}

/// Scoring weights. Bounds mirror `fetch`-style field validation: all
/// weights are finite and non-negative.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub tier_0_weight: f64,
    pub tier_1_weight: f64,
    pub tier_2_weight: f64,
    pub topic_match_weight: f64,
    pub topic_score_cap: f64,
    pub recency_decay_factor: f64,
    pub entity_match_weight: f64,
    pub citation_weight: f64,
    pub citation_cap: f64,
    pub cross_source_weight: f64,
    pub cross_source_cap: f64,
    pub llm_relevance_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tier_0_weight: 3.0,
            tier_1_weight: 2.0,
            tier_2_weight: 1.0,
            topic_match_weight: 1.0,
            topic_score_cap: 5.0,
            recency_decay_factor: 0.1,
            entity_match_weight: 1.0,
            citation_weight: 1.0,
            citation_cap: 1000.0,
            cross_source_weight: 1.0,
            cross_source_cap: 3.0,
            llm_relevance_weight: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuotasConfig {
    pub top5_max: usize,
    pub radar_max: usize,
    pub papers_max: usize,
    pub per_source_max: usize,
    pub arxiv_per_category_max: usize,
    pub llm_bypass_threshold: f64,
}

impl Default for QuotasConfig {
    fn default() -> Self {
        Self {
            top5_max: 5,
            radar_max: 10,
            papers_max: 10,
            per_source_max: 10,
            arxiv_per_category_max: 10,
            llm_bypass_threshold: 1.1, // > 1.0 disables bypass by default
        }
    }
}

/// Immutable configuration consumed by every pipeline stage. Built once at
/// run start from already-validated YAML documents (out of this crate's
/// scope) and passed down unchanged.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub sources: Vec<SourceConfig>,
    pub entities: Vec<EntityConfig>,
    pub topics: Vec<TopicConfig>,
    pub scoring: ScoringConfig,
    pub quotas: QuotasConfig,
    pub canonical_url_strip_params: Vec<String>,
    pub prefer_primary_link_order: Vec<String>,
    pub max_workers: usize,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            entities: Vec::new(),
            topics: Vec::new(),
            scoring: ScoringConfig::default(),
            quotas: QuotasConfig::default(),
            canonical_url_strip_params: vec![
                "utm_source".into(),
                "utm_medium".into(),
                "utm_campaign".into(),
                "ref".into(),
            ],
            prefer_primary_link_order: vec![
                "official".into(),
                "github".into(),
                "huggingface".into(),
                "arxiv".into(),
                "paper".into(),
                "blog".into(),
                "news".into(),
            ],
            max_workers: 8,
        }
    }
}
