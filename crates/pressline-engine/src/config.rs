//! Runtime configuration loaded from environment variables. Real source,
//! entity, and topic configuration is loaded and schema-validated by an
//! external YAML layer out of this repo's scope (spec.md §1/§6); this
//! module only wires up the handful of settings the binary needs to run
//! at all (database path, output directory, worker bounds) and hands back
//! an [`EffectiveConfig`] a caller can extend with real sources.

use std::env;

use pressline_common::config::EffectiveConfig;
use pressline_fetch::config::{FetchConfig, RetryPolicy};

/// Settings outside [`EffectiveConfig`]'s scope: where things are read
/// from and written to, not what to collect or how to score it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub db_path: String,
    pub output_dir: String,
    pub user_agent: String,
    pub lookback_days: i64,
    pub retention_days: i64,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("PRESSLINE_DB_PATH").unwrap_or_else(|_| "sqlite://pressline.db".to_string()),
            output_dir: env::var("PRESSLINE_OUTPUT_DIR").unwrap_or_else(|_| "./site".to_string()),
            user_agent: env::var("PRESSLINE_USER_AGENT").unwrap_or_else(|_| "pressline/0.1 (+https://example.com/bot)".to_string()),
            lookback_days: env::var("PRESSLINE_LOOKBACK_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(7),
            retention_days: env::var("PRESSLINE_RETENTION_DAYS").ok().and_then(|v| v.parse().ok()).unwrap_or(90),
        }
    }

    /// Logs which settings came from the environment without leaking the
    /// values themselves.
    pub fn log_redacted(&self) {
        tracing::info!(
            db_path = %self.db_path,
            output_dir = %self.output_dir,
            lookback_days = self.lookback_days,
            retention_days = self.retention_days,
            "engine config loaded",
        );
    }

    pub fn fetch_config(&self) -> Result<FetchConfig, pressline_fetch::FetchConfigError> {
        FetchConfig::new(self.user_agent.clone(), 30.0, 10 * 1024 * 1024, RetryPolicy::default(), Vec::new(), false)
    }
}

/// Placeholder source/entity/topic configuration until the external YAML
/// loader is wired in. Scoring and quota defaults still apply.
pub fn empty_effective_config() -> EffectiveConfig {
    EffectiveConfig::default()
}
