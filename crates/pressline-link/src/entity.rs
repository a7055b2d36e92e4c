//! Matches each item's title and raw payload text against configured
//! entity keyword lists. Short keywords (<=4 alphabetic chars, e.g. "RL")
//! require word-boundary anchors so they don't fire on substrings like
//! "URL"; longer keywords match anywhere in the text.

use pressline_common::config::EntityConfig;
use regex::Regex;

const SHORT_KEYWORD_MAX_LEN: usize = 4;

struct CompiledEntity {
    id: String,
    whole_word: Vec<Regex>,
    substrings: Vec<String>,
}

/// Precompiles every entity's keyword list once, so repeated per-item
/// matching during linking doesn't rebuild regexes.
pub struct EntityMatcher {
    entities: Vec<CompiledEntity>,
}

impl EntityMatcher {
    pub fn new(entities: &[EntityConfig]) -> Self {
        let compiled = entities
            .iter()
            .map(|entity| {
                let mut whole_word = Vec::new();
                let mut substrings = Vec::new();
                for keyword in &entity.keywords {
                    let is_short = keyword.chars().count() <= SHORT_KEYWORD_MAX_LEN && keyword.chars().all(|c| c.is_ascii_alphabetic());
                    if is_short {
                        let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
                        if let Ok(re) = Regex::new(&pattern) {
                            whole_word.push(re);
                        }
                    } else {
                        substrings.push(keyword.to_lowercase());
                    }
                }
                CompiledEntity {
                    id: entity.id.clone(),
                    whole_word,
                    substrings,
                }
            })
            .collect();

        Self { entities: compiled }
    }

    /// Returns the sorted, deduplicated set of entity IDs whose keywords
    /// appear in `text`.
    pub fn match_entities(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut matched: Vec<String> = self
            .entities
            .iter()
            .filter(|entity| {
                entity.whole_word.iter().any(|re| re.is_match(text)) || entity.substrings.iter().any(|kw| lower.contains(kw.as_str()))
            })
            .map(|entity| entity.id.clone())
            .collect();
        matched.sort();
        matched.dedup();
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressline_common::config::Region;

    fn entity(id: &str, keywords: &[&str]) -> EntityConfig {
        EntityConfig {
            id: id.to_string(),
            name: id.to_string(),
            region: Region::Intl,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            prefer_links: Vec::new(),
        }
    }

    #[test]
    fn short_keyword_requires_word_boundary() {
        let matcher = EntityMatcher::new(&[entity("rl-lab", &["RL"])]);
        assert_eq!(matcher.match_entities("new RL algorithm"), vec!["rl-lab".to_string()]);
        assert!(matcher.match_entities("see this URL for details").is_empty());
    }

    #[test]
    fn long_keyword_matches_as_substring() {
        let matcher = EntityMatcher::new(&[entity("anthropic", &["anthropic"])]);
        assert_eq!(matcher.match_entities("AnthropicAI releases Claude"), vec!["anthropic".to_string()]);
    }

    #[test]
    fn matches_are_sorted_and_deduplicated() {
        let matcher = EntityMatcher::new(&[entity("b-corp", &["beta"]), entity("a-corp", &["alpha"])]);
        let matched = matcher.match_entities("alpha and beta and alpha again");
        assert_eq!(matched, vec!["a-corp".to_string(), "b-corp".to_string()]);
    }
}
