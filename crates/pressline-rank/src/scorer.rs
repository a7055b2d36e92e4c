use std::collections::HashSet;

use chrono::{DateTime, Utc};
use pressline_common::config::{ScoringConfig, TopicConfig};
use pressline_common::{ContentKind, ScoreComponents, Story};

use crate::topic::TopicMatcher;

const MAX_RECENCY_DAYS: f64 = 30.0;
const UNDATED_RECENCY_SCORE: f64 = 0.1;

fn kind_weight(kind: ContentKind) -> f64 {
    match kind {
        ContentKind::Blog => 1.5,
        ContentKind::Paper => 1.2,
        ContentKind::Model => 1.8,
        ContentKind::Release => 1.6,
        ContentKind::News => 0.8,
        ContentKind::Docs => 1.0,
        ContentKind::Forum => 0.6,
        ContentKind::Social => 0.5,
        ContentKind::Dataset => 1.0,
    }
}

/// Source IDs whose presence among a story's raw items signals
/// cross-source corroboration worth rewarding.
const QUALITY_SIGNAL_SOURCES: &[&str] = &["papers-with-code", "hf-daily-papers", "arxiv-api"];

pub struct StoryScorer {
    scoring: ScoringConfig,
    entity_ids: HashSet<String>,
    topic_matcher: TopicMatcher,
    now: DateTime<Utc>,
}

impl StoryScorer {
    pub fn new(scoring: ScoringConfig, topics: &[TopicConfig], entity_ids: &[String], now: DateTime<Utc>) -> Self {
        Self {
            topic_matcher: TopicMatcher::new(topics),
            entity_ids: entity_ids.iter().cloned().collect(),
            scoring,
            now,
        }
    }

    pub fn score_story(&self, story: &Story) -> ScoreComponents {
        let tier_score = self.tier_score(story);
        let kind_score = self.kind_score(story);
        let topic_score = self.topic_score(story);
        let recency_score = self.recency_score(story);
        let entity_score = self.entity_score(story);
        let citation_score = self.citation_score(story);
        let cross_source_score = self.cross_source_score(story);
        let semantic_score = 0.0;
        let llm_relevance_score = self.llm_relevance_score(story);

        let total_score =
            tier_score + kind_score + topic_score + recency_score + entity_score + citation_score + cross_source_score + semantic_score + llm_relevance_score;

        ScoreComponents {
            tier_score,
            kind_score,
            topic_score,
            recency_score,
            entity_score,
            citation_score,
            cross_source_score,
            semantic_score,
            llm_relevance_score,
            total_score,
        }
    }

    fn tier_score(&self, story: &Story) -> f64 {
        match story.primary_link.tier {
            0 => self.scoring.tier_0_weight,
            1 => self.scoring.tier_1_weight,
            _ => self.scoring.tier_2_weight,
        }
    }

    fn kind_score(&self, story: &Story) -> f64 {
        story.raw_items.first().map(|item| kind_weight(item.kind)).unwrap_or(1.0)
    }

    fn topic_score(&self, story: &Story) -> f64 {
        let mut text = story.title.to_lowercase();
        for item in &story.raw_items {
            text.push(' ');
            text.push_str(&item.title.to_lowercase());
        }
        self.topic_matcher.compute_boost_score(&text, self.scoring.topic_match_weight, self.scoring.topic_score_cap)
    }

    fn recency_score(&self, story: &Story) -> f64 {
        let Some(published_at) = story.published_at else {
            return UNDATED_RECENCY_SCORE;
        };
        let days_old = (self.now - published_at).num_seconds() as f64 / 86_400.0;
        let days_old = days_old.max(0.0).min(MAX_RECENCY_DAYS);
        (-self.scoring.recency_decay_factor * days_old).exp()
    }

    fn entity_score(&self, story: &Story) -> f64 {
        if story.entities.is_empty() {
            return 0.0;
        }
        let matched = story.entities.iter().filter(|id| self.entity_ids.contains(*id)).count();
        self.scoring.entity_match_weight * matched as f64
    }

    fn citation_score(&self, story: &Story) -> f64 {
        let citations = story
            .raw_items
            .iter()
            .find_map(|item| item.raw_value().get("citations").and_then(|v| v.as_f64()));
        let Some(citations) = citations else {
            return 0.0;
        };
        let cap = self.scoring.citation_cap.max(1.0);
        ((1.0 + citations).ln() / (1.0 + cap).ln()) * self.scoring.citation_weight
    }

    fn cross_source_score(&self, story: &Story) -> f64 {
        let signal_count = story
            .raw_items
            .iter()
            .filter(|item| {
                QUALITY_SIGNAL_SOURCES.contains(&item.source_id.as_str())
                    || item.raw_value().get("quality_signal").and_then(|v| v.as_bool()).unwrap_or(false)
            })
            .count();
        (signal_count as f64 * self.scoring.cross_source_weight).min(self.scoring.cross_source_cap)
    }

    fn llm_relevance_score(&self, story: &Story) -> f64 {
        if self.scoring.llm_relevance_weight <= 0.0 {
            return 0.0;
        }
        let raw_llm_score = story
            .raw_items
            .iter()
            .find_map(|item| item.raw_value().get("llm_relevance_score").and_then(|v| v.as_f64()));
        raw_llm_score.map(|raw| raw * self.scoring.llm_relevance_weight).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pressline_common::{ContentKind, DateConfidence, Item, LinkType, StoryLink};

    use super::*;

    fn story(tier: u8, kind: ContentKind, published_at: Option<DateTime<Utc>>, title: &str) -> Story {
        let link = StoryLink {
            url: "https://example.com/a".to_string(),
            link_type: LinkType::Blog,
            source_id: "blog-a".to_string(),
            tier,
            title: title.to_string(),
        };
        let item = Item {
            url: link.url.clone(),
            source_id: link.source_id.clone(),
            tier,
            kind,
            title: title.to_string(),
            published_at,
            date_confidence: DateConfidence::High,
            content_hash: "h".to_string(),
            raw_json: "{}".to_string(),
            first_seen_at: published_at.unwrap_or_else(|| Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
            last_seen_at: published_at.unwrap_or_else(|| Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
        };
        Story {
            story_id: "fallback:x".to_string(),
            title: title.to_string(),
            primary_link: link.clone(),
            links: vec![link],
            entities: Vec::new(),
            section: None,
            published_at,
            arxiv_id: None,
            hf_model_id: None,
            github_release_url: None,
            item_count: 1,
            raw_items: vec![item],
        }
    }

    #[test]
    fn undated_story_gets_penalized_recency() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let scorer = StoryScorer::new(ScoringConfig::default(), &[], &[], now);
        let components = scorer.score_story(&story(0, ContentKind::Blog, None, "Undated"));
        assert_eq!(components.recency_score, UNDATED_RECENCY_SCORE);
    }

    #[test]
    fn fresh_story_scores_near_full_recency() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let scorer = StoryScorer::new(ScoringConfig::default(), &[], &[], now);
        let components = scorer.score_story(&story(0, ContentKind::Blog, Some(now), "Fresh"));
        assert!((components.recency_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tier_zero_scores_highest_tier_weight() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let scoring = ScoringConfig::default();
        let scorer = StoryScorer::new(scoring.clone(), &[], &[], now);
        let components = scorer.score_story(&story(0, ContentKind::Blog, Some(now), "Tier zero"));
        assert_eq!(components.tier_score, scoring.tier_0_weight);
    }
}
