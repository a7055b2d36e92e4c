use serde::Serialize;

/// Record of one atomically-written output file.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
    pub relative_path: String,
    pub absolute_path: String,
    pub bytes_written: usize,
    pub sha256: String,
}

/// All files written by one render pass, plus aggregate byte count.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderManifest {
    pub run_id: String,
    pub run_date: String,
    pub generated_at: String,
    pub files: Vec<GeneratedFile>,
    pub total_bytes: usize,
    pub duration_ms: f64,
}

impl RenderManifest {
    pub fn new(run_id: impl Into<String>, run_date: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            run_date: run_date.into(),
            generated_at: generated_at.into(),
            files: Vec::new(),
            total_bytes: 0,
            duration_ms: 0.0,
        }
    }

    pub fn add_file(&mut self, file: GeneratedFile) {
        self.total_bytes += file.bytes_written;
        self.files.push(file);
    }
}

/// Outcome of one [`crate::render::StaticRenderer::render`] call.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub success: bool,
    pub manifest: RenderManifest,
    pub error_summary: Option<String>,
}
