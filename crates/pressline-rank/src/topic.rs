//! Precompiled topic keyword matching. Keywords of four characters or
//! fewer get word-boundary anchors (so "RL" doesn't fire on "URL");
//! longer keywords match as a plain substring. Each topic counts at most
//! once per call, first matching keyword wins.

use pressline_common::config::TopicConfig;
use regex::Regex;

const SHORT_KEYWORD_MAX_LEN: usize = 4;

struct CompiledTopic {
    boost_weight: f64,
    whole_word: Vec<Regex>,
    substrings: Vec<String>,
}

pub struct TopicMatcher {
    topics: Vec<CompiledTopic>,
}

impl TopicMatcher {
    pub fn new(topics: &[TopicConfig]) -> Self {
        let compiled = topics
            .iter()
            .map(|topic| {
                let mut whole_word = Vec::new();
                let mut substrings = Vec::new();
                for keyword in &topic.keywords {
                    let is_short_alnum = keyword.chars().count() <= SHORT_KEYWORD_MAX_LEN && keyword.chars().all(|c| c.is_alphanumeric());
                    if is_short_alnum {
                        let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
                        if let Ok(re) = Regex::new(&pattern) {
                            whole_word.push(re);
                        }
                    } else {
                        substrings.push(keyword.to_lowercase());
                    }
                }
                CompiledTopic {
                    boost_weight: topic.boost_weight,
                    whole_word,
                    substrings,
                }
            })
            .collect();

        Self { topics: compiled }
    }

    /// Sum of `boost_weight * topic_match_weight` across every topic that
    /// matched `text`, capped at `cap`.
    pub fn compute_boost_score(&self, text: &str, topic_match_weight: f64, cap: f64) -> f64 {
        let lower = text.to_lowercase();
        let total: f64 = self
            .topics
            .iter()
            .filter(|topic| topic.whole_word.iter().any(|re| re.is_match(text)) || topic.substrings.iter().any(|kw| lower.contains(kw.as_str())))
            .map(|topic| topic.boost_weight * topic_match_weight)
            .sum();
        total.min(cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(keywords: &[&str], boost_weight: f64) -> TopicConfig {
        TopicConfig {
            name: "t".to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            boost_weight,
            prefer_primary_link_order: Vec::new(),
        }
    }

    #[test]
    fn short_keyword_requires_word_boundary() {
        let matcher = TopicMatcher::new(&[topic(&["RL"], 1.0)]);
        assert!(matcher.compute_boost_score("a paper about RL", 1.0, 10.0) > 0.0);
        assert_eq!(matcher.compute_boost_score("see this URL", 1.0, 10.0), 0.0);
    }

    #[test]
    fn score_is_capped() {
        let matcher = TopicMatcher::new(&[topic(&["alpha"], 10.0), topic(&["beta"], 10.0)]);
        assert_eq!(matcher.compute_boost_score("alpha beta", 1.0, 5.0), 5.0);
    }
}
