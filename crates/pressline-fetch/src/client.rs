use std::time::Instant;

use futures::StreamExt;
use rand::Rng;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheManager, HttpCacheStore};
use crate::config::FetchConfig;
use crate::error::{FetchError, FetchErrorClass};
use crate::metrics::FetchMetrics;
use crate::redact::{redact_headers, redact_url_credentials};
use crate::result::FetchResult;

/// HTTP client with conditional-request caching, retries, and per-source
/// failure isolation. A fetch failure is returned inside [`FetchResult`],
/// never as an `Err`, so one bad source cannot abort a collection run.
pub struct HttpFetcher<'a> {
    config: &'a FetchConfig,
    cache: CacheManager<'a>,
    client: reqwest::Client,
    run_id: uuid::Uuid,
}

impl<'a> HttpFetcher<'a> {
    pub fn new(config: &'a FetchConfig, store: &'a dyn HttpCacheStore, run_id: uuid::Uuid) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().redirect(reqwest::redirect::Policy::limited(10)).build()?;
        Ok(Self {
            config,
            cache: CacheManager::new(store),
            client,
            run_id,
        })
    }

    pub async fn fetch(
        &self,
        source_id: &str,
        url: &str,
        extra_headers: &[(String, String)],
    ) -> FetchResult {
        let start = Instant::now();
        let domain = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)).unwrap_or_default();

        let span = tracing::info_span!(
            "fetch",
            run_id = %self.run_id,
            source_id,
            domain = domain.as_str(),
        );
        let _guard = span.enter();

        let mut headers = self.build_headers(&domain, extra_headers);
        match self.cache.conditional_headers(source_id).await {
            Ok(conditional) => headers.extend(conditional),
            Err(e) => warn!(source_id, error = %e, "failed to load http cache entry"),
        }

        let result = self.execute_with_retry(url, &domain, headers).await;

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        FetchMetrics::get_instance().record_duration(duration_ms);

        if let Err(e) = self.cache.update_from_result(source_id, &result, chrono::Utc::now()).await {
            warn!(source_id, error = %e, "failed to update http cache entry");
        }

        info!(
            source_id,
            status_code = result.status_code,
            cache_hit = result.cache_hit,
            bytes = result.body_bytes.len(),
            duration_ms = duration_ms.round(),
            error_class = result.error.as_ref().map(|e| e.error_class.as_str()),
            "fetch complete"
        );

        result
    }

    fn build_headers(&self, domain: &str, extra_headers: &[(String, String)]) -> Vec<(String, String)> {
        let mut headers = vec![
            ("User-Agent".to_string(), self.config.user_agent.clone()),
            ("Accept".to_string(), "*/*".to_string()),
            ("Accept-Encoding".to_string(), "gzip, deflate".to_string()),
        ];
        headers.extend(self.config.headers_for_domain(domain));
        headers.extend_from_slice(extra_headers);
        headers
    }

    async fn execute_with_retry(&self, url: &str, domain: &str, headers: Vec<(String, String)>) -> FetchResult {
        let policy = self.config.retry_policy;
        let timeout = self.config.timeout_for_domain(domain);
        let metrics = FetchMetrics::get_instance();
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..=policy.max_retries {
            if attempt > 0 {
                let jitter_unit: f64 = rand::rng().random_range(0.0..1.0);
                let delay = policy.delay_with_jitter(attempt - 1, jitter_unit);
                metrics.record_retry();
                debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying fetch");
                tokio::time::sleep(delay).await;
            }

            let result = self.execute_single(url, &headers, timeout, attempt).await;

            match &result.error {
                None => return result,
                Some(error) if !policy.should_retry(error, attempt) => return result,
                Some(error) => {
                    if error.error_class == FetchErrorClass::RateLimited {
                        if let Some(retry_after) = error.retry_after {
                            let capped = retry_after.min(policy.max_retry_after_seconds);
                            info!(retry_after, attempt, "rate limited, honoring Retry-After");
                            tokio::time::sleep(std::time::Duration::from_secs(capped)).await;
                        }
                    }
                    last_error = Some(error.clone());
                }
            }
        }

        let error_class = last_error.as_ref().map(|e| e.error_class).unwrap_or(FetchErrorClass::Unknown);
        metrics.record_failure(error_class);
        FetchResult {
            status_code: last_error.as_ref().and_then(|e| e.status_code).unwrap_or(0),
            final_url: url.to_string(),
            headers: Vec::new(),
            body_bytes: Vec::new(),
            cache_hit: false,
            error: last_error,
        }
    }

    async fn execute_single(&self, url: &str, headers: &[(String, String)], timeout: std::time::Duration, attempt: u32) -> FetchResult {
        debug!(
            attempt,
            headers = ?redact_headers(headers),
            url = redact_url_credentials(url),
            "sending request"
        );

        let mut request = self.client.get(url).timeout(timeout);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return FetchResult {
                    status_code: 0,
                    final_url: url.to_string(),
                    headers: Vec::new(),
                    body_bytes: Vec::new(),
                    cache_hit: false,
                    error: Some(FetchError::new(FetchErrorClass::NetworkTimeout, format!("request timed out: {e}"))),
                };
            }
            Err(e) if e.is_connect() => {
                return FetchResult {
                    status_code: 0,
                    final_url: url.to_string(),
                    headers: Vec::new(),
                    body_bytes: Vec::new(),
                    cache_hit: false,
                    error: Some(FetchError::new(FetchErrorClass::ConnectionError, format!("connection failed: {e}"))),
                };
            }
            Err(e) => {
                let class = if e.to_string().to_lowercase().contains("ssl") || e.to_string().to_lowercase().contains("tls") {
                    FetchErrorClass::SslError
                } else {
                    FetchErrorClass::Unknown
                };
                return FetchResult {
                    status_code: 0,
                    final_url: url.to_string(),
                    headers: Vec::new(),
                    body_bytes: Vec::new(),
                    cache_hit: false,
                    error: Some(FetchError::new(class, format!("request failed: {e}"))),
                };
            }
        };

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let response_headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();

        if let Some(len) = response_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<u64>().ok())
        {
            if len > self.config.max_response_size_bytes {
                return FetchResult {
                    status_code,
                    final_url,
                    headers: response_headers,
                    body_bytes: Vec::new(),
                    cache_hit: false,
                    error: Some(
                        FetchError::new(
                            FetchErrorClass::ResponseSizeExceeded,
                            format!("response size {len} exceeds limit {}", self.config.max_response_size_bytes),
                        )
                        .with_status(status_code),
                    ),
                };
            }
        }

        if status_code == 304 {
            FetchMetrics::get_instance().record_cache_hit();
            return FetchResult {
                status_code,
                final_url,
                headers: response_headers,
                body_bytes: Vec::new(),
                cache_hit: true,
                error: None,
            };
        }

        let body = match self.read_body_with_limit(response).await {
            Ok(b) => b,
            Err(_) => {
                return FetchResult {
                    status_code,
                    final_url,
                    headers: response_headers,
                    body_bytes: Vec::new(),
                    cache_hit: false,
                    error: Some(
                        FetchError::new(FetchErrorClass::ResponseSizeExceeded, "response exceeded size limit while streaming")
                            .with_status(status_code),
                    ),
                };
            }
        };

        FetchMetrics::get_instance().record_request(status_code, body.len());

        let error = Self::classify_http_error(status_code, &response_headers);
        FetchResult {
            status_code,
            final_url,
            headers: response_headers,
            body_bytes: body,
            cache_hit: false,
            error,
        }
    }

    async fn read_body_with_limit(&self, response: reqwest::Response) -> Result<Vec<u8>, ()> {
        let max_size = self.config.max_response_size_bytes as usize;
        let mut buffer = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|_| ())?;
            buffer.extend_from_slice(&chunk);
            if buffer.len() > max_size {
                return Err(());
            }
        }
        Ok(buffer)
    }

    fn classify_http_error(status_code: u16, headers: &[(String, String)]) -> Option<FetchError> {
        if (200..300).contains(&status_code) {
            return None;
        }
        if status_code == 429 {
            let retry_after = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("retry-after"))
                .and_then(|(_, v)| Self::parse_retry_after(v));
            let mut err = FetchError::new(FetchErrorClass::RateLimited, "rate limited (429 Too Many Requests)")
                .with_status(status_code);
            if let Some(seconds) = retry_after {
                err = err.with_retry_after(seconds);
            }
            return Some(err);
        }
        if (400..500).contains(&status_code) {
            return Some(FetchError::new(FetchErrorClass::Http4xx, format!("client error ({status_code})")).with_status(status_code));
        }
        if (500..600).contains(&status_code) {
            return Some(FetchError::new(FetchErrorClass::Http5xx, format!("server error ({status_code})")).with_status(status_code));
        }
        None
    }

    fn parse_retry_after(value: &str) -> Option<u64> {
        if let Ok(seconds) = value.parse::<u64>() {
            return Some(seconds);
        }
        let parsed = chrono::DateTime::parse_from_rfc2822(value).ok()?;
        let delta = parsed.with_timezone(&chrono::Utc) - chrono::Utc::now();
        Some(delta.num_seconds().max(0) as u64)
    }
}
