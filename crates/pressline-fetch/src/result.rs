use crate::error::FetchError;

/// Outcome of one fetch attempt sequence (after retries are exhausted or a
/// terminal response is reached). Failures are carried as data in `error`
/// rather than as an `Err` so a failing source never aborts the run.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status_code: u16,
    pub final_url: String,
    pub headers: Vec<(String, String)>,
    pub body_bytes: Vec<u8>,
    pub cache_hit: bool,
    pub error: Option<FetchError>,
}

impl FetchResult {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
