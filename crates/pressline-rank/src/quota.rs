use std::collections::{BTreeMap, HashMap};

use pressline_common::config::QuotasConfig;
use pressline_common::{DroppedEntry, RankerOutput, ScoredStory, Story, StorySection};

const ARXIV_CATEGORY_PATTERNS: &[&str] = &["cs.AI", "cs.LG", "cs.CL", "cs.CV", "stat.ML"];

fn sort_key(scored: &ScoredStory) -> (i64, i64, String) {
    let score_bits = (-scored.components.total_score) as f64;
    let neg_score = (score_bits * 1_000_000.0).round() as i64;
    let pub_key = match scored.story.published_at {
        Some(ts) => -ts.timestamp(),
        None => i64::MAX,
    };
    (neg_score, pub_key, scored.story.primary_link.url.clone())
}

fn sort_by_score(stories: &mut [ScoredStory]) {
    stories.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}

fn extract_arxiv_category(story: &Story) -> Option<&'static str> {
    story.arxiv_id.as_ref()?;
    let url = story.primary_link.url.to_lowercase();
    if let Some(cat) = ARXIV_CATEGORY_PATTERNS.iter().find(|cat| url.contains(&cat.to_lowercase())) {
        return Some(cat);
    }
    for item in &story.raw_items {
        if let Some(cat) = ARXIV_CATEGORY_PATTERNS.iter().find(|cat| item.raw_json.contains(*cat)) {
            return Some(cat);
        }
    }
    Some("unknown")
}

fn is_model_release(story: &Story) -> bool {
    if story.hf_model_id.is_some() {
        return true;
    }
    !story.entities.is_empty() && story.raw_items.iter().any(|item| item.kind == pressline_common::ContentKind::Model)
}

fn is_paper(story: &Story) -> bool {
    story.arxiv_id.is_some() || story.raw_items.iter().any(|item| item.kind == pressline_common::ContentKind::Paper)
}

/// Applies per-source and arXiv-per-category caps, then assigns sections,
/// in order: per-source cap -> arXiv category cap -> Top5 -> model releases
/// -> papers -> radar (overflow dropped).
pub struct QuotaFilter {
    quotas: QuotasConfig,
    llm_relevance_weight: f64,
    dropped: Vec<DroppedEntry>,
}

impl QuotaFilter {
    pub fn new(quotas: QuotasConfig, llm_relevance_weight: f64) -> Self {
        Self {
            quotas,
            llm_relevance_weight,
            dropped: Vec::new(),
        }
    }

    pub fn dropped_entries(&self) -> &[DroppedEntry] {
        &self.dropped
    }

    fn has_llm_bypass(&self, scored: &ScoredStory) -> bool {
        let threshold = self.quotas.llm_bypass_threshold;
        if threshold >= 1.0 || self.llm_relevance_weight <= 0.0 {
            return false;
        }
        let raw_score = scored.components.llm_relevance_score / self.llm_relevance_weight;
        raw_score >= threshold
    }

    fn apply_per_source_quota(&mut self, stories: Vec<ScoredStory>) -> Vec<ScoredStory> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut result = Vec::with_capacity(stories.len());

        for mut scored in stories {
            let source_id = scored.story.primary_link.source_id.clone();
            let count = *counts.entry(source_id.clone()).or_insert(0);

            if count >= self.quotas.per_source_max {
                if self.has_llm_bypass(&scored) {
                    *counts.get_mut(&source_id).unwrap() += 1;
                } else {
                    scored.dropped = true;
                    scored.drop_reason = Some(format!("per_source_max ({})", self.quotas.per_source_max));
                    self.dropped.push(DroppedEntry {
                        story_id: scored.story.story_id.clone(),
                        source_id,
                        score: scored.components.total_score,
                        drop_reason: "per_source_max".to_string(),
                        arxiv_category: None,
                    });
                }
            } else {
                *counts.get_mut(&source_id).unwrap() += 1;
            }
            result.push(scored);
        }

        result
    }

    fn apply_arxiv_category_quota(&mut self, stories: Vec<ScoredStory>) -> Vec<ScoredStory> {
        let mut counts: HashMap<&'static str, usize> = HashMap::new();
        let mut result = Vec::with_capacity(stories.len());

        for mut scored in stories {
            if scored.dropped {
                result.push(scored);
                continue;
            }

            let Some(category) = extract_arxiv_category(&scored.story) else {
                result.push(scored);
                continue;
            };

            let count = *counts.entry(category).or_insert(0);
            if self.has_llm_bypass(&scored) {
                *counts.get_mut(category).unwrap() += 1;
            } else if count >= self.quotas.arxiv_per_category_max {
                scored.dropped = true;
                scored.drop_reason = Some(format!("arxiv_per_category_max ({})", self.quotas.arxiv_per_category_max));
                self.dropped.push(DroppedEntry {
                    story_id: scored.story.story_id.clone(),
                    source_id: scored.story.primary_link.source_id.clone(),
                    score: scored.components.total_score,
                    drop_reason: "arxiv_category".to_string(),
                    arxiv_category: Some(category.to_string()),
                });
            } else {
                *counts.get_mut(category).unwrap() += 1;
            }
            result.push(scored);
        }

        result
    }

    /// Applies both caps, sorted deterministically first. Returns
    /// (kept, dropped) partitions.
    pub fn apply_quotas(&mut self, mut stories: Vec<ScoredStory>) -> (Vec<ScoredStory>, Vec<ScoredStory>) {
        self.dropped.clear();
        sort_by_score(&mut stories);

        let after_source = self.apply_per_source_quota(stories);
        let after_arxiv = self.apply_arxiv_category_quota(after_source);

        let (dropped, kept): (Vec<_>, Vec<_>) = after_arxiv.into_iter().partition(|s| s.dropped);
        (kept, dropped)
    }

    /// Assigns sections over the kept-and-sorted list: Top5, then model
    /// releases (grouped by first matching entity), then papers (capped),
    /// then radar (overflow dropped with reason `radar_max`). The
    /// checksum is left empty here; callers compute it over the combined
    /// output once sections are final.
    pub fn assign_sections(&mut self, kept: Vec<ScoredStory>) -> RankerOutput {
        let mut slots: Vec<Option<ScoredStory>> = {
            let mut sorted = kept;
            sort_by_score(&mut sorted);
            sorted.into_iter().map(Some).collect()
        };

        let mut top5 = Vec::new();
        for slot in slots.iter_mut() {
            if top5.len() >= self.quotas.top5_max {
                break;
            }
            if let Some(mut scored) = slot.take() {
                scored.assigned_section = Some(StorySection::Top5);
                top5.push(scored);
            }
        }

        let mut model_releases_by_entity: BTreeMap<String, Vec<ScoredStory>> = BTreeMap::new();
        for slot in slots.iter_mut() {
            let is_release = slot.as_ref().is_some_and(|s| is_model_release(&s.story));
            if !is_release {
                continue;
            }
            let mut scored = slot.take().expect("checked Some above");
            scored.assigned_section = Some(StorySection::ModelReleases);
            let entity_key = scored.story.entities.first().cloned().unwrap_or_else(|| "other".to_string());
            model_releases_by_entity.entry(entity_key).or_default().push(scored);
        }

        let mut papers = Vec::new();
        for slot in slots.iter_mut() {
            if papers.len() >= self.quotas.papers_max {
                break;
            }
            let is_paper_story = slot.as_ref().is_some_and(|s| is_paper(&s.story));
            if !is_paper_story {
                continue;
            }
            let mut scored = slot.take().expect("checked Some above");
            scored.assigned_section = Some(StorySection::Papers);
            papers.push(scored);
        }

        let mut radar = Vec::new();
        for slot in slots.iter_mut() {
            let Some(mut scored) = slot.take() else {
                continue;
            };
            if radar.len() >= self.quotas.radar_max {
                let reason = format!("radar_max ({})", self.quotas.radar_max);
                self.dropped.push(DroppedEntry {
                    story_id: scored.story.story_id.clone(),
                    source_id: scored.story.primary_link.source_id.clone(),
                    score: scored.components.total_score,
                    drop_reason: "radar_max".to_string(),
                    arxiv_category: None,
                });
                scored.dropped = true;
                scored.drop_reason = Some(reason);
                continue;
            }
            scored.assigned_section = Some(StorySection::Radar);
            radar.push(scored);
        }

        RankerOutput {
            top5,
            model_releases_by_entity,
            papers,
            radar,
            checksum_sha256: String::new(),
        }
    }
}
