//! Atomic file writing: write to a sibling `.tmp` path, then rename over
//! the target, so readers never observe a partial file.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::GeneratedFile;

pub struct AtomicWriter {
    base_dir: PathBuf,
    run_id: String,
}

impl AtomicWriter {
    pub fn new(base_dir: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            run_id: run_id.into(),
        }
    }

    pub fn write(&self, path: &Path, content: &str) -> std::io::Result<GeneratedFile> {
        let content_bytes = content.as_bytes();
        let sha256 = pressline_common::hash::checksum_sha256(content_bytes);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut tmp_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("output").to_string();
        tmp_name.push_str(".tmp");
        let temp_path = path.with_file_name(tmp_name);

        std::fs::write(&temp_path, content_bytes)?;
        std::fs::rename(&temp_path, path)?;

        let relative_path = path.strip_prefix(&self.base_dir).unwrap_or(path).to_string_lossy().into_owned();

        debug!(run_id = %self.run_id, path = %relative_path, bytes = content_bytes.len(), "file written");

        Ok(GeneratedFile {
            relative_path,
            absolute_path: path.to_string_lossy().into_owned(),
            bytes_written: content_bytes.len(),
            sha256,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_file_and_computes_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AtomicWriter::new(dir.path(), "run-1");
        let target = dir.path().join("api/daily.json");

        let file = writer.write(&target, "{}").unwrap();

        assert_eq!(file.bytes_written, 2);
        assert_eq!(file.relative_path, "api/daily.json");
        assert!(target.exists());
        assert!(!target.with_extension("json.tmp").exists());
    }

    #[test]
    fn overwrites_existing_file_without_partial_state() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AtomicWriter::new(dir.path(), "run-1");
        let target = dir.path().join("index.html");

        writer.write(&target, "first").unwrap();
        writer.write(&target, "second, longer content").unwrap();

        let content = std::fs::read_to_string(&target).unwrap();
        assert_eq!(content, "second, longer content");
    }
}
