use std::time::Duration;

use regex::Regex;

use crate::error::{FetchConfigError, FetchError, FetchErrorClass};

const FORBIDDEN_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key"];

/// Per-domain header/timeout overrides, matched by regex against the
/// request host.
#[derive(Debug, Clone)]
pub struct DomainProfile {
    pattern: Regex,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl DomainProfile {
    pub fn new(
        domain_pattern: &str,
        headers: Vec<(String, String)>,
        timeout_seconds: f64,
    ) -> Result<Self, FetchConfigError> {
        let pattern =
            Regex::new(domain_pattern).map_err(|e| FetchConfigError::InvalidPattern(e.to_string()))?;
        for (key, _) in &headers {
            if FORBIDDEN_HEADERS.contains(&key.to_lowercase().as_str()) {
                return Err(FetchConfigError::ForbiddenHeader { header: key.clone() });
            }
        }
        if !(1.0..=300.0).contains(&timeout_seconds) {
            return Err(FetchConfigError::OutOfBounds {
                field: "timeout_seconds".into(),
                detail: format!("must be within 1.0..=300.0, got {timeout_seconds}"),
            });
        }
        Ok(Self {
            pattern,
            headers,
            timeout: Duration::from_secs_f64(timeout_seconds),
        })
    }

    pub fn matches(&self, host: &str) -> bool {
        self.pattern.is_match(host)
    }
}

/// Exponential backoff with jitter: delay(n) = min(base * exp_base^n, max) *
/// (1 + uniform[0, jitter)).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
    pub jitter_factor: f64,
    pub max_retry_after_seconds: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            exponential_base: 2.0,
            jitter_factor: 0.1,
            max_retry_after_seconds: 60,
        }
    }
}

impl RetryPolicy {
    /// Base delay (without jitter) for the attempt following `attempt`
    /// (0-indexed). Jitter is applied separately by the caller so tests can
    /// assert on the deterministic floor.
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let scaled = self.base_delay_ms as f64 * self.exponential_base.powi(attempt as i32);
        scaled.min(self.max_delay_ms as f64) as u64
    }

    pub fn delay_with_jitter(&self, attempt: u32, jitter_unit: f64) -> Duration {
        let base = self.base_delay_ms(attempt) as f64;
        let jittered = base * (1.0 + self.jitter_factor * jitter_unit.clamp(0.0, 1.0));
        Duration::from_millis(jittered.round() as u64)
    }

    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        matches!(
            error.error_class,
            FetchErrorClass::NetworkTimeout
                | FetchErrorClass::ConnectionError
                | FetchErrorClass::Http5xx
                | FetchErrorClass::RateLimited
        )
    }
}

/// Validated-by-construction configuration for the fetch layer.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub default_timeout: Duration,
    pub max_response_size_bytes: u64,
    pub retry_policy: RetryPolicy,
    pub domain_profiles: Vec<DomainProfile>,
    pub fail_fast: bool,
}

impl FetchConfig {
    pub fn new(
        user_agent: impl Into<String>,
        default_timeout_seconds: f64,
        max_response_size_bytes: u64,
        retry_policy: RetryPolicy,
        domain_profiles: Vec<DomainProfile>,
        fail_fast: bool,
    ) -> Result<Self, FetchConfigError> {
        let user_agent = user_agent.into();
        if user_agent.is_empty() || user_agent.len() > 500 {
            return Err(FetchConfigError::OutOfBounds {
                field: "user_agent".into(),
                detail: "must be 1..=500 chars".into(),
            });
        }
        if !(1.0..=300.0).contains(&default_timeout_seconds) {
            return Err(FetchConfigError::OutOfBounds {
                field: "default_timeout_seconds".into(),
                detail: format!("must be within 1.0..=300.0, got {default_timeout_seconds}"),
            });
        }
        if !(1024..=100 * 1024 * 1024).contains(&max_response_size_bytes) {
            return Err(FetchConfigError::OutOfBounds {
                field: "max_response_size_bytes".into(),
                detail: format!("must be within 1KiB..=100MiB, got {max_response_size_bytes}"),
            });
        }
        Ok(Self {
            user_agent,
            default_timeout: Duration::from_secs_f64(default_timeout_seconds),
            max_response_size_bytes,
            retry_policy,
            domain_profiles,
            fail_fast,
        })
    }

    pub fn profile_for_domain(&self, domain: &str) -> Option<&DomainProfile> {
        self.domain_profiles.iter().find(|p| p.matches(domain))
    }

    pub fn timeout_for_domain(&self, domain: &str) -> Duration {
        self.profile_for_domain(domain).map(|p| p.timeout).unwrap_or(self.default_timeout)
    }

    pub fn headers_for_domain(&self, domain: &str) -> Vec<(String, String)> {
        self.profile_for_domain(domain).map(|p| p.headers.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_profile_rejects_forbidden_headers() {
        let err = DomainProfile::new("example\\.com$", vec![("Authorization".into(), "x".into())], 30.0)
            .unwrap_err();
        assert!(matches!(err, FetchConfigError::ForbiddenHeader { .. }));
    }

    #[test]
    fn retry_policy_caps_exponential_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay_ms(0), 500);
        assert_eq!(policy.base_delay_ms(1), 1000);
        assert_eq!(policy.base_delay_ms(10), policy.max_delay_ms);
    }

    #[test]
    fn retry_policy_does_not_retry_4xx() {
        let policy = RetryPolicy::default();
        let err = FetchError::new(FetchErrorClass::Http4xx, "client error").with_status(404);
        assert!(!policy.should_retry(&err, 0));
    }

    #[test]
    fn retry_policy_retries_5xx_until_exhausted() {
        let policy = RetryPolicy::default();
        let err = FetchError::new(FetchErrorClass::Http5xx, "server error").with_status(503);
        assert!(policy.should_retry(&err, 0));
        assert!(policy.should_retry(&err, 2));
        assert!(!policy.should_retry(&err, 3));
    }
}
