//! Mock HTTP transport for fixture-backed collector tests. Maps URLs to
//! pre-recorded bytes by exact string or regex match; unmatched URLs either
//! 404 or raise, per `allow_unmatched`. Network access never happens in
//! this mode.

use regex::Regex;

pub struct FetchedFixture {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

enum Matcher {
    Exact(String),
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, url: &str) -> bool {
        match self {
            Matcher::Exact(s) => s == url,
            Matcher::Pattern(re) => re.is_match(url),
        }
    }
}

struct Entry {
    matcher: Matcher,
    fixture: FetchedFixture,
}

/// A mock transport for collector adapters, mapping URLs to pre-recorded
/// fixture bytes.
pub struct FixtureTransport {
    entries: Vec<Entry>,
    allow_unmatched: bool,
}

impl FixtureTransport {
    pub fn new(allow_unmatched: bool) -> Self {
        Self {
            entries: Vec::new(),
            allow_unmatched,
        }
    }

    pub fn with_exact(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>, content_type: &'static str) -> Self {
        self.entries.push(Entry {
            matcher: Matcher::Exact(url.into()),
            fixture: FetchedFixture {
                status_code: 200,
                body: body.into(),
                content_type,
            },
        });
        self
    }

    pub fn with_pattern(mut self, pattern: &str, body: impl Into<Vec<u8>>, content_type: &'static str) -> Self {
        let re = Regex::new(pattern).expect("fixture pattern must be a valid regex");
        self.entries.push(Entry {
            matcher: Matcher::Pattern(re),
            fixture: FetchedFixture {
                status_code: 200,
                body: body.into(),
                content_type,
            },
        });
        self
    }

    pub fn fetch(&self, url: &str) -> Result<FetchedFixture, FixtureError> {
        for entry in &self.entries {
            if entry.matcher.matches(url) {
                return Ok(FetchedFixture {
                    status_code: entry.fixture.status_code,
                    body: entry.fixture.body.clone(),
                    content_type: entry.fixture.content_type,
                });
            }
        }

        if self.allow_unmatched {
            Ok(FetchedFixture {
                status_code: 404,
                body: Vec::new(),
                content_type: "text/plain",
            })
        } else {
            Err(FixtureError::Unmatched(url.to_string()))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("no fixture registered for url: {0}")]
    Unmatched(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_unmatched() {
        let transport = FixtureTransport::new(true).with_exact("https://example.com/feed.xml", "<rss/>", "text/xml");
        let fixture = transport.fetch("https://example.com/feed.xml").unwrap();
        assert_eq!(fixture.status_code, 200);
        assert_eq!(fixture.body, b"<rss/>");
    }

    #[test]
    fn pattern_match_applies_to_many_urls() {
        let transport = FixtureTransport::new(true).with_pattern(r"^https://api\.github\.com/repos/.+/releases$", "[]", "application/json");
        assert!(transport.fetch("https://api.github.com/repos/foo/bar/releases").is_ok());
    }

    #[test]
    fn unmatched_returns_404_when_allowed() {
        let transport = FixtureTransport::new(true);
        let fixture = transport.fetch("https://unknown.example.com").unwrap();
        assert_eq!(fixture.status_code, 404);
    }

    #[test]
    fn unmatched_errors_when_disallowed() {
        let transport = FixtureTransport::new(false);
        assert!(transport.fetch("https://unknown.example.com").is_err());
    }
}
