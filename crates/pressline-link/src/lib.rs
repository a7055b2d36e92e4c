pub mod entity;
pub mod error;
pub mod grouping;
pub mod primary;

pub use entity::EntityMatcher;
pub use error::LinkError;
pub use grouping::{link_items, LinkerResult, MergeRationale};

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pressline_common::config::{EntityConfig, Region};
    use pressline_common::{ContentKind, DateConfidence, Item};

    use super::*;

    fn item(source_id: &str, url: &str, title: &str, raw: serde_json::Value, kind: ContentKind) -> Item {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Item {
            url: url.to_string(),
            source_id: source_id.to_string(),
            tier: 0,
            kind,
            title: title.to_string(),
            published_at: Some(now),
            date_confidence: DateConfidence::High,
            content_hash: "hash".to_string(),
            raw_json: raw.to_string(),
            first_seen_at: now,
            last_seen_at: now,
        }
    }

    #[test]
    fn arxiv_id_groups_items_across_sources() {
        let a = item("arxiv-rss", "https://arxiv.org/abs/2401.12345", "A Paper", serde_json::json!({"arxiv_id": "2401.12345"}), ContentKind::Paper);
        let b = item(
            "papers-with-code",
            "https://paperswithcode.com/paper/2401-12345",
            "A Paper (mirrored)",
            serde_json::json!({"arxiv_id": "2401.12345"}),
            ContentKind::Paper,
        );

        let matcher = EntityMatcher::new(&[]);
        let result = link_items(vec![a, b], &matcher, &["arxiv".to_string()]).unwrap();

        assert_eq!(result.stories.len(), 1);
        assert_eq!(result.stories[0].story_id, "arxiv:2401.12345");
        assert_eq!(result.stories[0].item_count, 2);
        assert_eq!(result.merges_total, 1);
        assert_eq!(result.fallback_merges, 0);
        assert_eq!(result.fallback_ratio(), 0.0);
    }

    #[test]
    fn untagged_items_group_by_title_fallback() {
        let a = item("blog-a", "https://a.example.com/post", "Same Headline", serde_json::Value::Null, ContentKind::Blog);
        let b = item("blog-b", "https://b.example.com/post", "same   headline", serde_json::Value::Null, ContentKind::Blog);

        let matcher = EntityMatcher::new(&[]);
        let result = link_items(vec![a, b], &matcher, &[]).unwrap();

        assert_eq!(result.stories.len(), 1);
        assert!(result.stories[0].story_id.starts_with("fallback:"));
        assert_eq!(result.merges_total, 1);
        assert_eq!(result.fallback_merges, 1);
        assert_eq!(result.fallback_ratio(), 1.0);
    }

    #[test]
    fn distinct_titles_stay_separate_stories() {
        let a = item("blog-a", "https://a.example.com/one", "First Story", serde_json::Value::Null, ContentKind::Blog);
        let b = item("blog-b", "https://b.example.com/two", "Second Story", serde_json::Value::Null, ContentKind::Blog);

        let matcher = EntityMatcher::new(&[EntityConfig {
            id: "acme".to_string(),
            name: "Acme".to_string(),
            region: Region::Intl,
            keywords: vec!["first".to_string()],
            prefer_links: Vec::new(),
        }]);
        let result = link_items(vec![a, b], &matcher, &[]).unwrap();

        assert_eq!(result.stories.len(), 2);
        assert_eq!(result.items_in, 2);
        assert_eq!(result.stories_out, 2);
        let first = result.stories.iter().find(|s| s.title == "First Story").unwrap();
        assert_eq!(first.entities, vec!["acme".to_string()]);
    }
}
