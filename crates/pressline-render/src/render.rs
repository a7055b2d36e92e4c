//! Orchestrates one render pass: `RenderPending -> RenderingJson ->
//! RenderingHtml -> RenderDone | RenderFailed`. Produces `api/daily.json`,
//! `index.html`, `day/YYYY-MM-DD.html`, `archive.html`, `sources.html`
//! and `status.html`, then prunes day pages older than the retention
//! window.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pressline_common::{RankerOutput, RunInfo, SourceStatus, Story};
use tracing::{error, info};

use crate::html::{HtmlRenderInput, HtmlRenderer};
use crate::json::render_daily_json;
use crate::io::AtomicWriter;
use crate::metrics::RenderMetrics;
use crate::models::{RenderManifest, RenderResult};
use crate::state::{RenderState, RenderStateMachine};

pub struct RenderConfig {
    pub output_dir: PathBuf,
    pub run_id: String,
    pub timezone: String,
    pub retention_days: i64,
}

impl RenderConfig {
    pub fn new(output_dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            run_id: run_id.into(),
            timezone: "UTC".to_string(),
            retention_days: 90,
        }
    }
}

pub struct StaticRenderer {
    run_id: String,
    output_dir: PathBuf,
    retention_days: i64,
    metrics: &'static RenderMetrics,
    state_machine: RenderStateMachine,
}

impl StaticRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            run_id: config.run_id.clone(),
            output_dir: config.output_dir,
            retention_days: config.retention_days,
            metrics: RenderMetrics::get_instance(),
            state_machine: RenderStateMachine::new(config.run_id),
        }
    }

    pub fn state(&self) -> RenderState {
        self.state_machine.state()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        ranker_output: &RankerOutput,
        sources_status: &[SourceStatus],
        run_info: &RunInfo,
        recent_runs: &[RunInfo],
        entity_catalog: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> RenderResult {
        let start = std::time::Instant::now();
        let run_date = now.format("%Y-%m-%d").to_string();
        let generated_at = now.to_rfc3339();

        let mut manifest = RenderManifest::new(self.run_id.clone(), run_date.clone(), generated_at.clone());

        info!(run_id = %self.run_id, run_date = %run_date, output_dir = %self.output_dir.display(), "render_started");

        match self.render_inner(ranker_output, sources_status, run_info, recent_runs, entity_catalog, &run_date, &generated_at, now, &mut manifest) {
            Ok(()) => {
                let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
                manifest.duration_ms = duration_ms;
                self.metrics.record_render_duration(duration_ms);
                self.metrics.record_bytes(manifest.total_bytes);
                for _ in &manifest.files {
                    self.metrics.record_file_generated();
                }

                info!(
                    run_id = %self.run_id,
                    file_count = manifest.files.len(),
                    total_bytes = manifest.total_bytes,
                    duration_ms = duration_ms,
                    "render_complete",
                );

                RenderResult { success: true, manifest, error_summary: None }
            }
            Err(err) => {
                let _ = self.state_machine.transition(RenderState::RenderFailed);
                self.metrics.record_failure();
                let error_summary = err.to_string();
                error!(run_id = %self.run_id, error = %error_summary, "render_failed");
                RenderResult { success: false, manifest, error_summary: Some(error_summary) }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_inner(
        &mut self,
        ranker_output: &RankerOutput,
        sources_status: &[SourceStatus],
        run_info: &RunInfo,
        recent_runs: &[RunInfo],
        entity_catalog: &serde_json::Value,
        run_date: &str,
        generated_at: &str,
        now: DateTime<Utc>,
        manifest: &mut RenderManifest,
    ) -> Result<(), crate::error::RenderError> {
        self.state_machine.transition(RenderState::RenderingJson)?;
        let writer = AtomicWriter::new(self.output_dir.clone(), self.run_id.clone());
        let archive_dates_so_far = self.archive_dates(run_date);
        let json_file = render_daily_json(
            &writer,
            &self.output_dir,
            &self.run_id,
            run_date,
            generated_at,
            ranker_output,
            sources_status,
            run_info,
            &archive_dates_so_far,
            entity_catalog,
        )
        .map_err(|source| crate::error::RenderError::Io { path: "api/daily.json".to_string(), source })?;
        manifest.add_file(json_file);

        self.state_machine.transition(RenderState::RenderingHtml)?;

        let top5 = stories_only(&ranker_output.top5);
        let papers = stories_only(&ranker_output.papers);
        let radar = stories_only(&ranker_output.radar);
        let model_releases_by_entity: std::collections::BTreeMap<String, Vec<Story>> = ranker_output
            .model_releases_by_entity
            .iter()
            .map(|(entity, stories)| (entity.clone(), stories_only(stories)))
            .collect();

        let html_renderer = HtmlRenderer::new(self.output_dir.clone(), self.run_id.clone())?;
        let input = HtmlRenderInput {
            run_id: &self.run_id,
            run_date,
            generated_at,
            top5: &top5,
            model_releases_by_entity: &model_releases_by_entity,
            papers: &papers,
            radar: &radar,
            sources_status,
            recent_runs,
            archive_dates: &archive_dates_so_far,
        };
        html_renderer.render(&input, manifest)?;

        self.prune_old_day_pages(now);

        self.state_machine.transition(RenderState::RenderDone)?;
        Ok(())
    }

    /// Existing `day/*.html` dates plus the date currently being rendered, descending.
    fn archive_dates(&self, current_date: &str) -> Vec<String> {
        let day_dir = self.output_dir.join("day");
        let mut dates: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
        dates.insert(current_date.to_string());

        if let Ok(entries) = std::fs::read_dir(&day_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("html") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if is_valid_date(stem) {
                        dates.insert(stem.to_string());
                    }
                }
            }
        }

        let mut dates: Vec<String> = dates.into_iter().collect();
        dates.reverse();
        dates
    }

    /// Deletes `day/*.html` files whose date stem is older than the retention window.
    fn prune_old_day_pages(&self, now: DateTime<Utc>) -> usize {
        let day_dir = self.output_dir.join("day");
        let Ok(entries) = std::fs::read_dir(&day_dir) else {
            return 0;
        };

        let cutoff = (now - chrono::Duration::days(self.retention_days)).format("%Y-%m-%d").to_string();
        let mut pruned = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if is_valid_date(&stem) && stem < cutoff {
                if std::fs::remove_file(&path).is_ok() {
                    pruned += 1;
                }
            }
        }

        if pruned > 0 {
            info!(run_id = %self.run_id, count = pruned, retention_days = self.retention_days, "day_pages_pruned");
        }
        pruned
    }
}

fn stories_only(scored: &[pressline_common::ScoredStory]) -> Vec<Story> {
    scored.iter().map(|s| s.story.clone()).collect()
}

fn is_valid_date(s: &str) -> bool {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressline_common::{LinkType, ScoreComponents, ScoredStory, StoryLink};

    fn story(title: &str) -> ScoredStory {
        let link = StoryLink {
            url: format!("https://example.com/{title}"),
            link_type: LinkType::Blog,
            source_id: "blog-a".to_string(),
            tier: 0,
            title: title.to_string(),
        };
        ScoredStory {
            story: Story {
                story_id: format!("fallback:{title}"),
                title: title.to_string(),
                primary_link: link.clone(),
                links: vec![link],
                entities: Vec::new(),
                section: None,
                published_at: None,
                arxiv_id: None,
                hf_model_id: None,
                github_release_url: None,
                item_count: 1,
                raw_items: Vec::new(),
            },
            components: ScoreComponents::default(),
            assigned_section: None,
            dropped: false,
            drop_reason: None,
        }
    }

    fn run_info(run_id: &str, now: DateTime<Utc>) -> RunInfo {
        RunInfo {
            run_id: run_id.to_string(),
            started_at: now,
            finished_at: Some(now),
            success: Some(true),
            error_summary: None,
            items_total: 1,
            stories_total: 1,
        }
    }

    #[test]
    fn full_render_pass_writes_all_pages_and_reaches_done() {
        let dir = tempfile::tempdir().unwrap();
        let now: DateTime<Utc> = "2026-01-15T00:00:00Z".parse().unwrap();
        let ranker_output = RankerOutput {
            top5: vec![story("alpha")],
            model_releases_by_entity: Default::default(),
            papers: Vec::new(),
            radar: Vec::new(),
            checksum_sha256: "abc".to_string(),
        };
        let run_info = run_info("run-1", now);

        let mut renderer = StaticRenderer::new(RenderConfig::new(dir.path(), "run-1"));
        let result = renderer.render(&ranker_output, &[], &run_info, &[run_info.clone()], &serde_json::json!({}), now);

        assert!(result.success, "{:?}", result.error_summary);
        assert_eq!(renderer.state(), RenderState::RenderDone);
        assert!(dir.path().join("api/daily.json").exists());
        assert!(dir.path().join("index.html").exists());
        assert!(dir.path().join("day/2026-01-15.html").exists());
        assert!(dir.path().join("archive.html").exists());
        assert!(dir.path().join("sources.html").exists());
        assert!(dir.path().join("status.html").exists());
    }

    #[test]
    fn prunes_day_pages_older_than_retention_window() {
        let dir = tempfile::tempdir().unwrap();
        let day_dir = dir.path().join("day");
        std::fs::create_dir_all(&day_dir).unwrap();
        std::fs::write(day_dir.join("2020-01-01.html"), "old").unwrap();
        std::fs::write(day_dir.join("2026-01-14.html"), "recent").unwrap();

        let now: DateTime<Utc> = "2026-01-15T00:00:00Z".parse().unwrap();
        let ranker_output = RankerOutput {
            top5: Vec::new(),
            model_releases_by_entity: Default::default(),
            papers: Vec::new(),
            radar: Vec::new(),
            checksum_sha256: "abc".to_string(),
        };
        let run_info = run_info("run-1", now);

        let mut renderer = StaticRenderer::new(RenderConfig::new(dir.path(), "run-1"));
        let result = renderer.render(&ranker_output, &[], &run_info, &[run_info.clone()], &serde_json::json!({}), now);

        assert!(result.success, "{:?}", result.error_summary);
        assert!(!day_dir.join("2020-01-01.html").exists());
        assert!(day_dir.join("2026-01-14.html").exists());
    }

    #[test]
    fn archive_dates_include_current_run_date_even_with_empty_day_dir() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = StaticRenderer::new(RenderConfig::new(dir.path(), "run-1"));
        let dates = renderer.archive_dates("2026-01-15");
        assert_eq!(dates, vec!["2026-01-15".to_string()]);
    }
}
