use std::collections::HashMap;

use pressline_common::hash::fallback_story_key;
use pressline_common::{ContentKind, Item, LinkType, Story, StoryLink};

use crate::entity::EntityMatcher;
use crate::error::LinkError;
use crate::primary::select_primary;

/// Audit record for one merge decision, mirroring the upstream linker's
/// `MergeRationale`.
#[derive(Debug, Clone)]
pub struct MergeRationale {
    pub story_id: String,
    pub matched_entity_ids: Vec<String>,
    pub matched_stable_ids: std::collections::BTreeMap<String, String>,
    pub fallback_heuristic: Option<String>,
    pub source_ids: Vec<String>,
    pub items_merged: usize,
}

/// Result of linking a run's collected items into Stories.
#[derive(Debug, Clone)]
pub struct LinkerResult {
    pub stories: Vec<Story>,
    pub items_in: usize,
    pub stories_out: usize,
    pub merges_total: usize,
    pub fallback_merges: usize,
    pub rationales: Vec<MergeRationale>,
}

impl LinkerResult {
    /// Fraction of merges that relied on the title-hash heuristic rather
    /// than a stable ID — a quality signal, not an error.
    pub fn fallback_ratio(&self) -> f64 {
        if self.merges_total == 0 {
            return 0.0;
        }
        self.fallback_merges as f64 / self.merges_total as f64
    }
}

enum StableId {
    Arxiv(String),
    HuggingFace(String),
    Github(String),
}

impl StableId {
    fn group_key(&self) -> String {
        match self {
            StableId::Arxiv(id) => format!("arxiv:{id}"),
            StableId::HuggingFace(id) => format!("hf:{id}"),
            StableId::Github(url) => format!("gh:{url}"),
        }
    }
}

fn stable_id_for(item: &Item) -> Option<StableId> {
    let raw = item.raw_value();
    let obj = raw.as_object()?;
    if let Some(id) = obj.get("arxiv_id").and_then(|v| v.as_str()) {
        return Some(StableId::Arxiv(id.to_string()));
    }
    if let Some(id) = obj.get("hf_model_id").and_then(|v| v.as_str()) {
        return Some(StableId::HuggingFace(id.to_string()));
    }
    if item.kind == ContentKind::Release {
        return Some(StableId::Github(item.url.clone()));
    }
    None
}

fn link_type_for(item: &Item, stable_id: Option<&StableId>) -> LinkType {
    match stable_id {
        Some(StableId::Arxiv(_)) => LinkType::Arxiv,
        Some(StableId::HuggingFace(_)) => LinkType::Huggingface,
        Some(StableId::Github(_)) => LinkType::Github,
        None => match item.kind {
            ContentKind::Blog => LinkType::Blog,
            ContentKind::Paper => LinkType::Paper,
            ContentKind::Release => LinkType::Github,
            ContentKind::News => LinkType::News,
            ContentKind::Model => LinkType::Model,
            ContentKind::Dataset => LinkType::Model,
            ContentKind::Docs => LinkType::Official,
            ContentKind::Forum | ContentKind::Social => LinkType::News,
        },
    }
}

struct GroupBuilder {
    key: String,
    stable_id: Option<StableId>,
    items: Vec<Item>,
}

/// Collapses items referring to the same underlying artifact into Stories.
/// `items` must already be sorted by `(source_id, first_seen_at, url)` so
/// that grouping and primary-link selection are deterministic regardless
/// of the order concurrent collector tasks happened to finish in.
pub fn link_items(items: Vec<Item>, entity_matcher: &EntityMatcher, prefer_primary_link_order: &[String]) -> Result<LinkerResult, LinkError> {
    let items_in = items.len();
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, GroupBuilder> = HashMap::new();

    for item in items {
        let stable_id = stable_id_for(&item);
        let key = stable_id.as_ref().map(StableId::group_key).unwrap_or_else(|| format!("fallback:{}", fallback_story_key(&item.title)));

        groups
            .entry(key.clone())
            .and_modify(|g| g.items.push(item.clone()))
            .or_insert_with(|| {
                order.push(key.clone());
                GroupBuilder {
                    key: key.clone(),
                    stable_id,
                    items: vec![item],
                }
            });
    }

    let mut stories = Vec::with_capacity(order.len());
    let mut rationales = Vec::with_capacity(order.len());
    let mut merges_total = 0usize;
    let mut fallback_merges = 0usize;

    for key in order {
        let group = groups.remove(&key).expect("key was just inserted into order");
        let is_fallback = group.stable_id.is_none();
        if group.items.len() > 1 {
            merges_total += 1;
            if is_fallback {
                fallback_merges += 1;
            }
        }

        let (story, rationale) = build_story(group, prefer_primary_link_order)?;
        stories.push(story);
        rationales.push(rationale);
    }

    let stories_out = stories.len();

    // entity matching runs last since it needs each story's folded title+raw text.
    for story in &mut stories {
        let text = format!("{} {}", story.title, story.raw_items.iter().map(|i| i.raw_json.as_str()).collect::<Vec<_>>().join(" "));
        story.entities = entity_matcher.match_entities(&text);
    }
    for (story, rationale) in stories.iter().zip(rationales.iter_mut()) {
        rationale.matched_entity_ids = story.entities.clone();
    }

    Ok(LinkerResult {
        stories,
        items_in,
        stories_out,
        merges_total,
        fallback_merges,
        rationales,
    })
}

fn build_story(group: GroupBuilder, prefer_primary_link_order: &[String]) -> Result<(Story, MergeRationale), LinkError> {
    let GroupBuilder { key, stable_id, items } = group;

    let mut links: Vec<StoryLink> = Vec::new();
    let mut seen_urls: HashMap<(String, LinkType), usize> = HashMap::new();

    for item in &items {
        let link_type = link_type_for(item, stable_id.as_ref());
        let dedup_key = (item.url.clone(), link_type);
        if seen_urls.contains_key(&dedup_key) {
            continue;
        }
        seen_urls.insert(dedup_key, links.len());
        links.push(StoryLink {
            url: item.url.clone(),
            link_type,
            source_id: item.source_id.clone(),
            tier: item.tier,
            title: item.title.clone(),
        });
    }

    if links.is_empty() {
        return Err(LinkError::EmptyGroup(key));
    }

    let primary_link = select_primary(&links, prefer_primary_link_order);

    let title = if primary_link.title.is_empty() {
        items.first().map(|i| i.title.clone()).unwrap_or_default()
    } else {
        primary_link.title.clone()
    };

    let published_at = items.iter().filter_map(|i| i.published_at).min();

    let mut source_ids: Vec<String> = items.iter().map(|i| i.source_id.clone()).collect();
    source_ids.sort();
    source_ids.dedup();

    let mut matched_stable_ids = std::collections::BTreeMap::new();
    let (arxiv_id, hf_model_id, github_release_url) = match &stable_id {
        Some(StableId::Arxiv(id)) => {
            matched_stable_ids.insert("arxiv_id".to_string(), id.clone());
            (Some(id.clone()), None, None)
        }
        Some(StableId::HuggingFace(id)) => {
            matched_stable_ids.insert("hf_model_id".to_string(), id.clone());
            (None, Some(id.clone()), None)
        }
        Some(StableId::Github(url)) => {
            matched_stable_ids.insert("github_release_url".to_string(), url.clone());
            (None, None, Some(url.clone()))
        }
        None => (None, None, None),
    };

    let fallback_heuristic = stable_id.is_none().then(|| "title_hash".to_string());

    let story = Story {
        story_id: key.clone(),
        title,
        primary_link,
        links,
        entities: Vec::new(),
        section: None,
        published_at,
        arxiv_id,
        hf_model_id,
        github_release_url,
        item_count: items.len() as u32,
        raw_items: items,
    };

    let rationale = MergeRationale {
        story_id: key,
        matched_entity_ids: Vec::new(),
        matched_stable_ids,
        fallback_heuristic,
        source_ids,
        items_merged: story.item_count as usize,
    };

    Ok((story, rationale))
}
