//! Deterministic hashing helpers shared by the collector, linker, and ranker.
//!
//! Every hash in this pipeline is SHA-256 over a stable UTF-8 input, hex
//! encoded. This is a deliberate choice over a faster non-cryptographic
//! hash: outputs are persisted (content_hash, story_id, checksum_sha256)
//! and compared across runs, so collision resistance matters more than
//! speed here.

use sha2::{Digest, Sha256};
use url::Url;

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Content hash for a collected item: SHA-256 over the canonical URL, title,
/// and published-at fields joined with `\n`. Two fetches of the same item
/// that yield identical hashes are treated as unchanged.
pub fn content_hash(canonical_url: &str, title: &str, published_at: Option<&str>) -> String {
    let joined = format!("{canonical_url}\n{title}\n{}", published_at.unwrap_or(""));
    sha256_hex(&joined)
}

/// Fallback story grouping key for items with no stable external ID
/// (no arxiv_id, hf_model_id, or github release URL): SHA-256 over the
/// lowercased, whitespace-collapsed title.
pub fn fallback_story_key(title: &str) -> String {
    let normalized = title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    sha256_hex(&normalized)
}

/// Canonicalize a URL for dedup and cache-key purposes: lowercase the
/// scheme and host, drop a default port, drop a trailing `/` on the path,
/// strip fragments, and remove tracking query parameters named in
/// `strip_params`. Query parameters that survive are sorted by name so
/// equivalent URLs with reordered parameters canonicalize identically.
pub fn canonicalize_url(raw: &str, strip_params: &[String]) -> Result<String, url::ParseError> {
    let mut url = Url::parse(raw)?;
    url.set_fragment(None);

    let kept_pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !strip_params.iter().any(|p| p == k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut sorted_pairs = kept_pairs;
    sorted_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    if sorted_pairs.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &sorted_pairs {
            serializer.append_pair(k, v);
        }
        url.set_query(Some(&serializer.finish()));
    }

    if url.path().len() > 1 && url.path().ends_with('/') {
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    Ok(url.as_str().to_string())
}

/// SHA-256 over a serialized value, used for the ranker's output checksum
/// and the renderer's manifest entries. Callers are responsible for
/// canonicalizing the serialization first (sorted object keys) so the
/// checksum is stable across runs.
pub fn checksum_sha256(canonical_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        let a = content_hash("https://example.com/x", "Title", Some("2026-01-01T00:00:00Z"));
        let b = content_hash("https://example.com/x", "Title", Some("2026-01-01T00:00:00Z"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn content_hash_changes_with_title() {
        let a = content_hash("https://example.com/x", "Title", None);
        let b = content_hash("https://example.com/x", "Other", None);
        assert_ne!(a, b);
    }

    #[test]
    fn fallback_story_key_normalizes_case_and_whitespace() {
        let a = fallback_story_key("  Hello   World  ");
        let b = fallback_story_key("hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn canonicalize_url_strips_tracking_params_and_sorts_remaining() {
        let strip = vec!["utm_source".to_string()];
        let out = canonicalize_url("https://Example.com/a/?b=2&utm_source=x&a=1", &strip).unwrap();
        assert_eq!(out, "https://example.com/a?a=1&b=2");
    }

    #[test]
    fn canonicalize_url_drops_trailing_slash_but_keeps_root() {
        let out = canonicalize_url("https://example.com/a/", &[]).unwrap();
        assert_eq!(out, "https://example.com/a");
        let root = canonicalize_url("https://example.com/", &[]).unwrap();
        assert_eq!(root, "https://example.com/");
    }
}
