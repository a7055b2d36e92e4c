//! Process-wide render counters, mirroring the fetch crate's singleton
//! pattern (ported from `renderer/metrics.py`'s module-level instance).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

#[derive(Default)]
pub struct RenderMetrics {
    render_duration_ms: AtomicU64,
    render_failures_total: AtomicU64,
    render_bytes_total: AtomicU64,
    files_generated: AtomicU64,
}

static INSTANCE: OnceLock<RenderMetrics> = OnceLock::new();

impl RenderMetrics {
    pub fn get_instance() -> &'static RenderMetrics {
        INSTANCE.get_or_init(RenderMetrics::default)
    }

    pub fn record_render_duration(&self, duration_ms: f64) {
        self.render_duration_ms.store(duration_ms.round() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.render_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, bytes_written: usize) {
        self.render_bytes_total.fetch_add(bytes_written as u64, Ordering::Relaxed);
    }

    pub fn record_file_generated(&self) {
        self.files_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            render_duration_ms: self.render_duration_ms.load(Ordering::Relaxed),
            render_failures_total: self.render_failures_total.load(Ordering::Relaxed),
            render_bytes_total: self.render_bytes_total.load(Ordering::Relaxed),
            files_generated: self.files_generated.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderMetricsSnapshot {
    pub render_duration_ms: u64,
    pub render_failures_total: u64,
    pub render_bytes_total: u64,
    pub files_generated: u64,
}
