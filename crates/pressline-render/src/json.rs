//! Assembles and writes `api/daily.json`. `serde_json::Value::Object` is
//! `BTreeMap`-backed by default, so building an ordinary `Value` already
//! gives sorted keys; `to_string_pretty` defaults to a two-space indent
//! and never escapes non-ASCII content.

use std::path::Path;

use pressline_common::{RankerOutput, RunInfo, SourceStatus};

use crate::io::AtomicWriter;
use crate::models::GeneratedFile;

pub fn render_daily_json(
    writer: &AtomicWriter,
    output_dir: &Path,
    run_id: &str,
    run_date: &str,
    generated_at: &str,
    ranker_output: &RankerOutput,
    sources_status: &[SourceStatus],
    run_info: &RunInfo,
    archive_dates: &[String],
    entity_catalog: &serde_json::Value,
) -> std::io::Result<GeneratedFile> {
    let digest = serde_json::json!({
        "run_id": run_id,
        "run_date": run_date,
        "generated_at": generated_at,
        "top5": section_to_json(&ranker_output.top5),
        "model_releases_by_entity": ranker_output
            .model_releases_by_entity
            .iter()
            .map(|(entity, stories)| (entity.clone(), section_to_json(stories)))
            .collect::<serde_json::Map<_, _>>(),
        "papers": section_to_json(&ranker_output.papers),
        "radar": section_to_json(&ranker_output.radar),
        "sources_status": sources_status,
        "run_info": run_info,
        "archive_dates": archive_dates,
        "entity_catalog": entity_catalog,
    });

    let content = serde_json::to_string_pretty(&digest).unwrap_or_else(|_| "{}".to_string());

    let path = output_dir.join("api").join("daily.json");
    writer.write(&path, &content)
}

fn section_to_json(stories: &[pressline_common::ScoredStory]) -> Vec<serde_json::Value> {
    stories.iter().map(|s| s.story.to_json_value()).collect()
}

#[cfg(test)]
mod tests {
    use pressline_common::RunRecord;

    use super::*;

    #[test]
    fn writes_sorted_key_json_with_empty_sections() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AtomicWriter::new(dir.path(), "run-1");
        let ranker_output = RankerOutput {
            top5: Vec::new(),
            model_releases_by_entity: Default::default(),
            papers: Vec::new(),
            radar: Vec::new(),
            checksum_sha256: "abc".to_string(),
        };
        let run_record = RunRecord {
            run_id: uuid::Uuid::nil(),
            started_at: chrono::Utc::now(),
            finished_at: None,
            success: None,
            error_summary: None,
        };
        let run_info = RunInfo {
            run_id: run_record.run_id.to_string(),
            started_at: run_record.started_at,
            finished_at: run_record.finished_at,
            success: run_record.success,
            error_summary: run_record.error_summary,
            items_total: 0,
            stories_total: 0,
        };

        let file = render_daily_json(
            &writer,
            dir.path(),
            "run-1",
            "2026-01-15",
            "2026-01-15T00:00:00Z",
            &ranker_output,
            &[],
            &run_info,
            &["2026-01-15".to_string()],
            &serde_json::json!({}),
        )
        .unwrap();

        let content = std::fs::read_to_string(dir.path().join("api/daily.json")).unwrap();
        assert!(content.starts_with('{'));
        assert!(content.contains("\"run_id\": \"run-1\""));
        assert_eq!(file.relative_path, "api/daily.json");
    }
}
