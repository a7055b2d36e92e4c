//! Process-wide fetch counters, ported from `fetch/metrics.py`'s
//! module-level `FetchMetrics` singleton.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use crate::error::FetchErrorClass;

#[derive(Default)]
pub struct FetchMetrics {
    requests_total: AtomicU64,
    retries_total: AtomicU64,
    cache_hits_total: AtomicU64,
    failures_total: AtomicU64,
    bytes_total: AtomicU64,
    duration_ms_total: AtomicU64,
}

static INSTANCE: OnceLock<FetchMetrics> = OnceLock::new();

impl FetchMetrics {
    pub fn get_instance() -> &'static FetchMetrics {
        INSTANCE.get_or_init(FetchMetrics::default)
    }

    pub fn record_request(&self, _status_code: u16, body_bytes: usize) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_total.fetch_add(body_bytes as u64, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, _error_class: FetchErrorClass) {
        self.failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duration(&self, duration_ms: f64) {
        self.duration_ms_total.fetch_add(duration_ms.round() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FetchMetricsSnapshot {
        FetchMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            retries_total: self.retries_total.load(Ordering::Relaxed),
            cache_hits_total: self.cache_hits_total.load(Ordering::Relaxed),
            failures_total: self.failures_total.load(Ordering::Relaxed),
            bytes_total: self.bytes_total.load(Ordering::Relaxed),
            duration_ms_total: self.duration_ms_total.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchMetricsSnapshot {
    pub requests_total: u64,
    pub retries_total: u64,
    pub cache_hits_total: u64,
    pub failures_total: u64,
    pub bytes_total: u64,
    pub duration_ms_total: u64,
}
