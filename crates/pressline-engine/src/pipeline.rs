//! Wires every stage crate into one run: fetch+collect -> link -> rank ->
//! render, with per-source status recorded independent of the overall
//! run's success so one bad source never hides the rest of the digest.

use chrono::{DateTime, Utc};
use pressline_common::clock::{Clock, SystemClock};
use pressline_common::config::EffectiveConfig;
use pressline_common::{RunInfo, SourceStatus};
use pressline_link::{link_items, EntityMatcher};
use pressline_rank::rank;
use pressline_render::{RenderConfig, RenderResult, StaticRenderer};
use pressline_status::{compute_source_status, SourceOutcomeView};
use pressline_store::StateStore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::PipelineError;

pub async fn run(engine: &EngineConfig, config: &EffectiveConfig) -> Result<RenderResult, PipelineError> {
    let run_id = Uuid::new_v4();
    let clock = SystemClock;
    let started_at = clock.now();

    let pool = pressline_store::connect(&engine.db_path).await?;
    let store = StateStore::new(pool);
    store.begin_run(run_id, started_at).await?;

    info!(run_id = %run_id, "pipeline run started");

    let run_result = run_inner(&run_id, engine, config, &store, &clock, started_at).await;

    let finished_at = clock.now();
    match &run_result {
        Ok(render_result) => {
            store.finish_run(run_id, finished_at, render_result.success, render_result.error_summary.as_deref()).await?;
        }
        Err(err) => {
            let _ = store.finish_run(run_id, finished_at, false, Some(&err.to_string())).await;
        }
    }

    run_result
}

async fn run_inner(
    run_id: &Uuid,
    engine: &EngineConfig,
    config: &EffectiveConfig,
    store: &StateStore,
    clock: &dyn Clock,
    started_at: DateTime<Utc>,
) -> Result<RenderResult, PipelineError> {
    let fetch_config = engine.fetch_config()?;
    let fetcher = pressline_fetch::HttpFetcher::new(&fetch_config, store, *run_id)?;
    let runner = pressline_collect::Runner::new(&fetcher, store, clock, config.max_workers);
    let collect_result = runner.run(&config.sources).await;

    let sources_status = build_sources_status(config, &collect_result.outcomes);

    let since = started_at - chrono::Duration::days(engine.lookback_days);
    let items = store.items_first_seen_after(since).await?;
    let items_total = items.len() as u32;

    let entity_matcher = EntityMatcher::new(&config.entities);
    let linker_result = link_items(items, &entity_matcher, &config.prefer_primary_link_order)?;
    info!(
        run_id = %run_id,
        items_in = linker_result.items_in,
        stories_out = linker_result.stories_out,
        fallback_ratio = linker_result.fallback_ratio(),
        "linking complete",
    );

    let (ranker_output, dropped) = rank(&run_id.to_string(), linker_result.stories, config, started_at)?;
    if !dropped.is_empty() {
        warn!(run_id = %run_id, dropped = dropped.len(), "stories dropped by quota filter");
    }

    let recent_runs = recent_run_infos(store, run_id, started_at, items_total, linker_result.stories_out as u32).await;

    let run_info = RunInfo {
        run_id: run_id.to_string(),
        started_at,
        finished_at: None,
        success: None,
        error_summary: None,
        items_total,
        stories_total: linker_result.stories_out as u32,
    };

    let entity_catalog = entity_catalog_json(config);

    let mut renderer = StaticRenderer::new(RenderConfig {
        output_dir: engine.output_dir.clone().into(),
        run_id: run_id.to_string(),
        timezone: "UTC".to_string(),
        retention_days: engine.retention_days,
    });

    let result = renderer.render(&ranker_output, &sources_status, &run_info, &recent_runs, &entity_catalog, clock.now());
    Ok(result)
}

fn build_sources_status(config: &EffectiveConfig, outcomes: &[pressline_collect::SourceOutcome]) -> Vec<SourceStatus> {
    outcomes
        .iter()
        .filter_map(|outcome| {
            let source = config.sources.iter().find(|s| s.id == outcome.source_id)?;
            let view = SourceOutcomeView {
                source_id: &outcome.source_id,
                name: &source.name,
                tier: source.tier,
                method: method_label(source.method),
                category: None,
                succeeded: outcome.error.is_none(),
                status_only: false,
                fetch_error_class: outcome.fetch_error_class,
                parse_error_class: outcome.parse_error_class,
                parse_error_message: outcome.parse_error_class.and(outcome.error.as_deref()),
                last_fetch_status_code: outcome.last_fetch_status_code,
                items_new: outcome.items_new as u32,
                items_updated: outcome.items_updated as u32,
                newest_item_date: None,
                dates_all_low_confidence: false,
            };
            Some(compute_source_status(&view))
        })
        .collect()
}

fn method_label(method: pressline_common::config::SourceMethod) -> &'static str {
    use pressline_common::config::SourceMethod::*;
    match method {
        Rss => "rss",
        Atom => "atom",
        ArxivApi => "arxiv_api",
        GithubReleases => "github_releases",
        HuggingFaceOrg => "huggingface_org",
        OpenReviewNotes => "openreview_notes",
        HtmlList => "html_list",
    }
}

async fn recent_run_infos(store: &StateStore, current_run_id: &Uuid, started_at: DateTime<Utc>, items_total: u32, stories_total: u32) -> Vec<RunInfo> {
    let mut infos: Vec<RunInfo> = store
        .recent_runs(10)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| &r.run_id != current_run_id)
        .map(|r| RunInfo {
            run_id: r.run_id.to_string(),
            started_at: r.started_at,
            finished_at: r.finished_at,
            success: r.success,
            error_summary: r.error_summary,
            items_total: 0,
            stories_total: 0,
        })
        .collect();

    infos.insert(
        0,
        RunInfo {
            run_id: current_run_id.to_string(),
            started_at,
            finished_at: None,
            success: None,
            error_summary: None,
            items_total,
            stories_total,
        },
    );
    infos
}

fn entity_catalog_json(config: &EffectiveConfig) -> serde_json::Value {
    let entries: serde_json::Map<String, serde_json::Value> = config
        .entities
        .iter()
        .map(|e| {
            let region = match e.region {
                pressline_common::config::Region::Cn => "cn",
                pressline_common::config::Region::Intl => "intl",
            };
            (e.id.clone(), serde_json::json!({ "name": e.name, "region": region }))
        })
        .collect();
    serde_json::Value::Object(entries)
}

#[cfg(test)]
mod tests {
    use pressline_collect::SourceOutcome;
    use pressline_collect::CollectorState;
    use pressline_common::config::{EntityConfig, Region, SourceConfig, SourceMethod};

    use super::*;

    fn entity(id: &str, region: Region) -> EntityConfig {
        EntityConfig {
            id: id.to_string(),
            name: format!("{id} display name"),
            region,
            keywords: Vec::new(),
            prefer_links: Vec::new(),
        }
    }

    #[test]
    fn entity_catalog_maps_id_to_name_and_region() {
        let mut config = EffectiveConfig::default();
        config.entities.push(entity("acme", Region::Intl));
        config.entities.push(entity("zh-labs", Region::Cn));

        let catalog = entity_catalog_json(&config);
        assert_eq!(catalog["acme"]["name"], "acme display name");
        assert_eq!(catalog["acme"]["region"], "intl");
        assert_eq!(catalog["zh-labs"]["region"], "cn");
    }

    #[test]
    fn build_sources_status_skips_outcomes_with_no_matching_source_config() {
        let config = EffectiveConfig::default();
        let outcomes = vec![SourceOutcome {
            source_id: "unknown-source".to_string(),
            state: CollectorState::SourceDone,
            items_new: 1,
            items_updated: 0,
            error: None,
            fetch_error_class: None,
            parse_error_class: None,
            last_fetch_status_code: None,
        }];

        let statuses = build_sources_status(&config, &outcomes);
        assert!(statuses.is_empty());
    }

    #[test]
    fn build_sources_status_reports_new_items_as_has_update() {
        let mut config = EffectiveConfig::default();
        config.sources.push(
            SourceConfig::new("blog-a", "Blog A", "https://blog-a.example.com/feed", 0, SourceMethod::Rss, "blog", "UTC", 50, true, None, Default::default())
                .unwrap(),
        );
        let outcomes = vec![SourceOutcome {
            source_id: "blog-a".to_string(),
            state: CollectorState::SourceDone,
            items_new: 3,
            items_updated: 0,
            error: None,
            fetch_error_class: None,
            parse_error_class: None,
            last_fetch_status_code: Some(200),
        }];

        let statuses = build_sources_status(&config, &outcomes);
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].items_new, 3);
        assert_eq!(statuses[0].reason_code, "FETCH_PARSE_OK_HAS_NEW");
    }

    #[test]
    fn build_sources_status_classifies_fetch_failure_by_typed_error_class() {
        let mut config = EffectiveConfig::default();
        config.sources.push(
            SourceConfig::new("blog-a", "Blog A", "https://blog-a.example.com/feed", 0, SourceMethod::Rss, "blog", "UTC", 50, true, None, Default::default())
                .unwrap(),
        );
        let outcomes = vec![SourceOutcome {
            source_id: "blog-a".to_string(),
            state: CollectorState::SourceDone,
            items_new: 0,
            items_updated: 0,
            error: Some("server error".to_string()),
            fetch_error_class: Some(pressline_fetch::FetchErrorClass::Http5xx),
            parse_error_class: None,
            last_fetch_status_code: Some(503),
        }];

        let statuses = build_sources_status(&config, &outcomes);
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].reason_code, "FETCH_HTTP_5XX");
        assert_eq!(statuses[0].last_fetch_status_code, Some(503));
    }
}
