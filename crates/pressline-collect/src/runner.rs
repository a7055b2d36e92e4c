use std::sync::Arc;

use chrono::{DateTime, Utc};
use pressline_common::clock::Clock;
use pressline_common::config::{SourceConfig, SourceMethod};
use pressline_common::hash::{canonicalize_url, content_hash};
use pressline_common::Item;
use pressline_fetch::{FetchErrorClass, HttpFetcher};
use pressline_store::StateStore;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::adapters::{self, RawItem};
use crate::error::{CollectError, ParseErrorClass};
use crate::ratelimit::{self, Platform};
use crate::state::{CollectorState, CollectorStateMachine};

const SOURCE_FETCH_DEADLINE_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source_id: String,
    pub state: CollectorState,
    pub items_new: usize,
    pub items_updated: usize,
    pub error: Option<String>,
    pub fetch_error_class: Option<FetchErrorClass>,
    pub parse_error_class: Option<ParseErrorClass>,
    pub last_fetch_status_code: Option<u16>,
}

/// Everything needed to classify why `collect` failed, carried out of the
/// function instead of collapsed into a plain `String` so the caller can
/// still tell a timeout from a 5xx from a schema mismatch.
struct CollectFailure {
    message: String,
    fetch_error_class: Option<FetchErrorClass>,
    parse_error_class: Option<ParseErrorClass>,
    status_code: Option<u16>,
}

impl CollectFailure {
    fn from_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fetch_error_class: None,
            parse_error_class: None,
            status_code: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunnerResult {
    pub outcomes: Vec<SourceOutcome>,
}

/// Drives every enabled source through fetch -> parse -> upsert, bounding
/// total concurrency at `max_workers` and isolating one source's failure
/// from the rest. Sources sharing a rate-limited platform (GitHub,
/// HuggingFace, OpenReview) serialize through that platform's token bucket
/// regardless of the overall concurrency bound.
pub struct Runner<'a> {
    fetcher: &'a HttpFetcher<'a>,
    store: &'a StateStore,
    clock: &'a dyn Clock,
    max_workers: usize,
}

impl<'a> Runner<'a> {
    pub fn new(fetcher: &'a HttpFetcher<'a>, store: &'a StateStore, clock: &'a dyn Clock, max_workers: usize) -> Self {
        Self {
            fetcher,
            store,
            clock,
            max_workers: max_workers.max(1),
        }
    }

    pub async fn run(&self, sources: &[SourceConfig]) -> RunnerResult {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut handles = Vec::with_capacity(sources.len());

        for source in sources.iter().filter(|s| s.enabled).cloned() {
            let semaphore = semaphore.clone();
            handles.push(async move {
                let _permit = semaphore.acquire().await.expect("runner semaphore never closes");
                self.run_one_source(&source).await
            });
        }

        let outcomes = futures::future::join_all(handles).await;
        RunnerResult { outcomes }
    }

    async fn run_one_source(&self, source: &SourceConfig) -> SourceOutcome {
        let mut machine = CollectorStateMachine::new(source.id.clone());
        let span = tracing::info_span!("collect_source", source_id = %source.id, method = ?source.method);
        let _enter = span.enter();

        if let Some(platform) = platform_for(source.method) {
            ratelimit::limiter_for(platform).acquire().await;
        }

        let deadline = std::time::Duration::from_secs(SOURCE_FETCH_DEADLINE_SECONDS);
        match timeout(deadline, self.collect(source, &mut machine)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(failure)) => {
                machine.fail(&failure.message);
                SourceOutcome {
                    source_id: source.id.clone(),
                    state: machine.state(),
                    items_new: 0,
                    items_updated: 0,
                    error: Some(failure.message),
                    fetch_error_class: failure.fetch_error_class,
                    parse_error_class: failure.parse_error_class,
                    last_fetch_status_code: failure.status_code,
                }
            }
            Err(_) => {
                let message = format!("source exceeded {SOURCE_FETCH_DEADLINE_SECONDS}s deadline");
                machine.fail(&message);
                warn!(source_id = %source.id, "source fetch timed out");
                SourceOutcome {
                    source_id: source.id.clone(),
                    state: machine.state(),
                    items_new: 0,
                    items_updated: 0,
                    error: Some(message),
                    fetch_error_class: Some(FetchErrorClass::NetworkTimeout),
                    parse_error_class: None,
                    last_fetch_status_code: None,
                }
            }
        }
    }

    async fn collect(&self, source: &SourceConfig, machine: &mut CollectorStateMachine) -> Result<SourceOutcome, CollectFailure> {
        let extra_headers: Vec<(String, String)> = source.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        machine.transition(CollectorState::Fetching).map_err(|e| CollectFailure::from_message(e.to_string()))?;
        let fetched_at = self.clock.now();
        let fetch_result = self.fetcher.fetch(&source.id, &source.url, &extra_headers).await;
        let status_code = (fetch_result.status_code != 0).then_some(fetch_result.status_code);

        if let Some(error) = &fetch_result.error {
            return Err(CollectFailure {
                message: error.to_string(),
                fetch_error_class: Some(error.error_class),
                parse_error_class: None,
                status_code: error.status_code.or(status_code),
            });
        }
        if fetch_result.cache_hit {
            machine.transition(CollectorState::SourceDone).map_err(|e| CollectFailure::from_message(e.to_string()))?;
            return Ok(SourceOutcome {
                source_id: source.id.clone(),
                state: machine.state(),
                items_new: 0,
                items_updated: 0,
                error: None,
                fetch_error_class: None,
                parse_error_class: None,
                last_fetch_status_code: status_code,
            });
        }

        machine.transition(CollectorState::Parsing).map_err(|e| CollectFailure::from_message(e.to_string()))?;
        let content_type = fetch_result.header("content-type").unwrap_or("application/octet-stream").to_string();
        let raw_items = adapters::parse(source, &fetch_result.body_bytes, &content_type, fetched_at).map_err(|e| {
            let parse_error_class = match &e {
                CollectError::Parse(parse_err) => Some(parse_err.class),
                _ => None,
            };
            CollectFailure {
                message: e.to_string(),
                fetch_error_class: None,
                parse_error_class,
                status_code,
            }
        })?;

        machine.transition(CollectorState::Upserting).map_err(|e| CollectFailure::from_message(e.to_string()))?;
        let items = self.build_items(source, raw_items, fetched_at).map_err(CollectFailure::from_message)?;
        let counts = self
            .store
            .upsert_items_for_source(&items)
            .await
            .map_err(|e| CollectFailure::from_message(e.to_string()))?;

        machine.transition(CollectorState::SourceDone).map_err(|e| CollectFailure::from_message(e.to_string()))?;
        info!(source_id = %source.id, items_new = counts.inserted, items_updated = counts.updated, "source collected");

        Ok(SourceOutcome {
            source_id: source.id.clone(),
            state: machine.state(),
            items_new: counts.inserted,
            items_updated: counts.updated,
            error: None,
            fetch_error_class: None,
            parse_error_class: None,
            last_fetch_status_code: status_code,
        })
    }

    fn build_items(&self, source: &SourceConfig, raw_items: Vec<RawItem>, fetched_at: DateTime<Utc>) -> Result<Vec<Item>, String> {
        raw_items
            .into_iter()
            .map(|raw| build_item(source, raw, fetched_at))
            .collect()
    }
}

fn build_item(source: &SourceConfig, raw: RawItem, fetched_at: DateTime<Utc>) -> Result<Item, String> {
    let canonical_url = canonicalize_url(&raw.url, &[]).map_err(|e| format!("invalid item url {}: {e}", raw.url))?;
    let hash = content_hash(&canonical_url, &raw.title, raw.published_at.map(|d| d.to_rfc3339()).as_deref());

    Ok(Item {
        url: canonical_url,
        source_id: source.id.clone(),
        tier: source.tier,
        kind: raw.kind,
        title: raw.title,
        published_at: raw.published_at,
        date_confidence: raw.date_confidence,
        content_hash: hash,
        raw_json: raw.raw.to_string(),
        first_seen_at: fetched_at,
        last_seen_at: fetched_at,
    })
}

fn platform_for(method: SourceMethod) -> Option<Platform> {
    match method {
        SourceMethod::GithubReleases => Some(Platform::Github),
        SourceMethod::HuggingFaceOrg => Some(Platform::HuggingFace),
        SourceMethod::OpenReviewNotes => Some(Platform::OpenReview),
        _ => None,
    }
}
