pub mod error;
pub mod quota;
pub mod scorer;
pub mod state;
pub mod topic;

use chrono::{DateTime, Utc};
use pressline_common::config::EffectiveConfig;
use pressline_common::{DroppedEntry, RankerOutput, ScoredStory, Story};

pub use error::RankError;
pub use quota::QuotaFilter;
pub use scorer::StoryScorer;
pub use state::{IllegalTransition, RankerState, RankerStateMachine};

/// Scores, filters, and sections a run's linked stories, driving the
/// ranker state machine from `STORIES_FINAL` through `ORDERED_OUTPUTS`.
/// Returns the ordered output plus every dropped story with its reason,
/// for the run record and status reporting.
pub fn rank(run_id: &str, stories: Vec<Story>, config: &EffectiveConfig, now: DateTime<Utc>) -> Result<(RankerOutput, Vec<DroppedEntry>), RankError> {
    let mut machine = RankerStateMachine::new(run_id);

    let entity_ids: Vec<String> = config.entities.iter().map(|e| e.id.clone()).collect();
    let scorer = StoryScorer::new(config.scoring.clone(), &config.topics, &entity_ids, now);

    let scored: Vec<ScoredStory> = stories
        .into_iter()
        .map(|story| {
            let components = scorer.score_story(&story);
            ScoredStory::new(story, components)
        })
        .collect();
    machine.transition(RankerState::Scored)?;

    let mut filter = QuotaFilter::new(config.quotas.clone(), config.scoring.llm_relevance_weight);
    let (kept, _quota_dropped) = filter.apply_quotas(scored);
    machine.transition(RankerState::QuotaFiltered)?;

    let mut output = filter.assign_sections(kept);
    output.checksum_sha256 = compute_checksum(&output);
    machine.transition(RankerState::OrderedOutputs)?;

    Ok((output, filter.dropped_entries().to_vec()))
}

/// Checksum over the ordered output: top5, then papers, then radar, then
/// model releases flattened across entities, each story reduced to its
/// rendered (`to_json_value`) form rather than its full internal
/// representation (raw_items excluded). `serde_json::Value::Object` is
/// `BTreeMap`-backed by default (no crate in this workspace enables
/// `preserve_order`), so keys serialize sorted without extra work.
fn compute_checksum(output: &RankerOutput) -> String {
    let mut ordered: Vec<&Story> = Vec::new();
    for scored in &output.top5 {
        ordered.push(&scored.story);
    }
    for scored in &output.papers {
        ordered.push(&scored.story);
    }
    for scored in &output.radar {
        ordered.push(&scored.story);
    }
    for stories in output.model_releases_by_entity.values() {
        for scored in stories {
            ordered.push(&scored.story);
        }
    }

    let values: Vec<serde_json::Value> = ordered.iter().map(|s| s.to_json_value()).collect();
    let canonical = serde_json::to_vec(&values).unwrap_or_default();
    pressline_common::hash::checksum_sha256(&canonical)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pressline_common::{ContentKind, DateConfidence, Item, LinkType, StoryLink};

    use super::*;

    fn story(id: &str, tier: u8, published_at: DateTime<Utc>) -> Story {
        let link = StoryLink {
            url: format!("https://example.com/{id}"),
            link_type: LinkType::Blog,
            source_id: "blog-a".to_string(),
            tier,
            title: id.to_string(),
        };
        let item = Item {
            url: link.url.clone(),
            source_id: link.source_id.clone(),
            tier,
            kind: ContentKind::Blog,
            title: id.to_string(),
            published_at: Some(published_at),
            date_confidence: DateConfidence::High,
            content_hash: format!("hash-{id}"),
            raw_json: "{}".to_string(),
            first_seen_at: published_at,
            last_seen_at: published_at,
        };
        Story {
            story_id: format!("fallback:{id}"),
            title: id.to_string(),
            primary_link: link.clone(),
            links: vec![link],
            entities: Vec::new(),
            section: None,
            published_at: Some(published_at),
            arxiv_id: None,
            hf_model_id: None,
            github_release_url: None,
            item_count: 1,
            raw_items: vec![item],
        }
    }

    #[test]
    fn rank_produces_deterministic_checksum_for_same_input() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let stories = vec![story("a", 0, now), story("b", 1, now)];
        let config = EffectiveConfig::default();

        let (first, _) = rank("run-1", stories.clone(), &config, now).unwrap();
        let (second, _) = rank("run-1", stories, &config, now).unwrap();

        assert_eq!(first.checksum_sha256, second.checksum_sha256);
        assert!(!first.checksum_sha256.is_empty());
    }

    #[test]
    fn higher_tier_story_ranks_first_in_top5() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let stories = vec![story("low-tier", 2, now), story("top-tier", 0, now)];
        let config = EffectiveConfig::default();

        let (output, _) = rank("run-1", stories, &config, now).unwrap();

        assert_eq!(output.top5.first().unwrap().story.story_id, "fallback:top-tier");
    }
}
