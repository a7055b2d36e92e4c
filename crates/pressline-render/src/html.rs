//! HTML rendering via `tera`, auto-escaping by default for every context
//! value interpolated into a template — the only defense against a story
//! title carrying a hostile payload.

use std::path::Path;

use pressline_common::{RunInfo, SourceStatus, Story};
use tera::{Context, Tera};

use crate::io::AtomicWriter;
use crate::models::RenderManifest;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html.tera");
const DAY_TEMPLATE: &str = include_str!("../templates/day.html.tera");
const ARCHIVE_TEMPLATE: &str = include_str!("../templates/archive.html.tera");
const SOURCES_TEMPLATE: &str = include_str!("../templates/sources.html.tera");
const STATUS_TEMPLATE: &str = include_str!("../templates/status.html.tera");

pub struct HtmlRenderer {
    tera: Tera,
    writer: AtomicWriter,
    output_dir: std::path::PathBuf,
}

pub struct HtmlRenderInput<'a> {
    pub run_id: &'a str,
    pub run_date: &'a str,
    pub generated_at: &'a str,
    pub top5: &'a [Story],
    pub model_releases_by_entity: &'a std::collections::BTreeMap<String, Vec<Story>>,
    pub papers: &'a [Story],
    pub radar: &'a [Story],
    pub sources_status: &'a [SourceStatus],
    pub recent_runs: &'a [RunInfo],
    pub archive_dates: &'a [String],
}

impl HtmlRenderer {
    pub fn new(output_dir: impl Into<std::path::PathBuf>, run_id: impl Into<String>) -> Result<Self, tera::Error> {
        let output_dir = output_dir.into();
        let run_id = run_id.into();
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("index.html", INDEX_TEMPLATE),
            ("day.html", DAY_TEMPLATE),
            ("archive.html", ARCHIVE_TEMPLATE),
            ("sources.html", SOURCES_TEMPLATE),
            ("status.html", STATUS_TEMPLATE),
        ])?;

        let writer = AtomicWriter::new(output_dir.clone(), run_id);
        Ok(Self { tera, writer, output_dir })
    }

    pub fn render(&self, input: &HtmlRenderInput<'_>, manifest: &mut RenderManifest) -> Result<(), crate::error::RenderError> {
        let mut common = Context::new();
        common.insert("run_id", input.run_id);
        common.insert("run_date", input.run_date);
        common.insert("generated_at", input.generated_at);

        let mut index_ctx = common.clone();
        index_ctx.insert("current_page", "index");
        index_ctx.insert("top5", input.top5);
        index_ctx.insert("model_releases_by_entity", input.model_releases_by_entity);
        index_ctx.insert("papers", input.papers);
        index_ctx.insert("radar", input.radar);
        self.render_template("index.html", &self.output_dir.join("index.html"), &index_ctx, manifest)?;

        let mut day_ctx = common.clone();
        day_ctx.insert("current_page", "day");
        day_ctx.insert("top5", input.top5);
        day_ctx.insert("model_releases_by_entity", input.model_releases_by_entity);
        day_ctx.insert("papers", input.papers);
        day_ctx.insert("radar", input.radar);
        let day_path = self.output_dir.join("day").join(format!("{}.html", input.run_date));
        self.render_template("day.html", &day_path, &day_ctx, manifest)?;

        let mut archive_ctx = common.clone();
        archive_ctx.insert("current_page", "archive");
        archive_ctx.insert("archive_dates", input.archive_dates);
        self.render_template("archive.html", &self.output_dir.join("archive.html"), &archive_ctx, manifest)?;

        let mut sources_ctx = common.clone();
        sources_ctx.insert("current_page", "sources");
        sources_ctx.insert("sources_status", input.sources_status);
        self.render_template("sources.html", &self.output_dir.join("sources.html"), &sources_ctx, manifest)?;

        let mut status_ctx = common;
        status_ctx.insert("current_page", "status");
        status_ctx.insert("recent_runs", input.recent_runs);
        self.render_template("status.html", &self.output_dir.join("status.html"), &status_ctx, manifest)?;

        Ok(())
    }

    fn render_template(&self, name: &str, path: &Path, ctx: &Context, manifest: &mut RenderManifest) -> Result<(), crate::error::RenderError> {
        let content = self.tera.render(name, ctx)?;
        let file = self.writer.write(path, &content).map_err(|source| crate::error::RenderError::Io {
            path: path.to_string_lossy().into_owned(),
            source,
        })?;
        manifest.add_file(file);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(title: &str, url: &str) -> Story {
        let link = pressline_common::StoryLink {
            url: url.to_string(),
            link_type: pressline_common::LinkType::Blog,
            source_id: "blog-a".to_string(),
            tier: 0,
            title: title.to_string(),
        };
        Story {
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
        }
    }

    #[test]
    fn xss_title_is_escaped_in_rendered_html() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = HtmlRenderer::new(dir.path(), "run-1").unwrap();
        let mut manifest = RenderManifest::new("run-1", "2026-01-15", "2026-01-15T00:00:00Z");

        let hostile = story(r#"<img src=x onerror="alert(1)">"#, "https://example.com/a");
        let input = HtmlRenderInput {
            run_id: "run-1",
            run_date: "2026-01-15",
            generated_at: "2026-01-15T00:00:00Z",
            top5: std::slice::from_ref(&hostile),
            model_releases_by_entity: &Default::default(),
            papers: &[],
            radar: &[],
            sources_status: &[],
            recent_runs: &[],
            archive_dates: &["2026-01-15".to_string()],
        };

        renderer.render(&input, &mut manifest).unwrap();

        let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(!index.contains("onerror=\"alert(1)\""));
        assert!(index.contains("&lt;img"));
        assert_eq!(manifest.files.len(), 5);
    }
}
