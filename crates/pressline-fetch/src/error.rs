use thiserror::Error;

/// Retry/surface classification for a failed fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorClass {
    NetworkTimeout,
    ConnectionError,
    Http4xx,
    Http5xx,
    RateLimited,
    ResponseSizeExceeded,
    SslError,
    Unknown,
}

impl FetchErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorClass::NetworkTimeout => "NETWORK_TIMEOUT",
            FetchErrorClass::ConnectionError => "CONNECTION_ERROR",
            FetchErrorClass::Http4xx => "HTTP_4XX",
            FetchErrorClass::Http5xx => "HTTP_5XX",
            FetchErrorClass::RateLimited => "RATE_LIMITED",
            FetchErrorClass::ResponseSizeExceeded => "RESPONSE_SIZE_EXCEEDED",
            FetchErrorClass::SslError => "SSL_ERROR",
            FetchErrorClass::Unknown => "UNKNOWN",
        }
    }
}

/// A classified fetch failure, carried inside a [`crate::FetchResult`] rather
/// than returned as an `Err` — fetch failures are data, not control flow,
/// since a failed source must not abort the rest of a run.
#[derive(Debug, Clone)]
pub struct FetchError {
    pub error_class: FetchErrorClass,
    pub message: String,
    pub status_code: Option<u16>,
    pub retry_after: Option<u64>,
}

impl FetchError {
    pub fn new(error_class: FetchErrorClass, message: impl Into<String>) -> Self {
        Self {
            error_class,
            message: message.into(),
            status_code: None,
            retry_after: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_class.as_str(), self.message)
    }
}

/// Errors raised constructing fetch-layer configuration, as opposed to
/// errors surfaced from an actual request (see [`FetchError`]).
#[derive(Error, Debug)]
pub enum FetchConfigError {
    #[error("invalid regex pattern for domain profile: {0}")]
    InvalidPattern(String),

    #[error("header '{header}' must not be stored in config; use environment variables")]
    ForbiddenHeader { header: String },

    #[error("{field} out of bounds: {detail}")]
    OutOfBounds { field: String, detail: String },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
