use serde::{Deserialize, Serialize};

/// Closed set of machine-readable reasons a source's status can carry.
/// New reasons are never added implicitly by a caller, only by extending
/// this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    FetchParseOkHasNew,
    FetchParseOkHasUpdated,
    FetchParseOkNoDelta,
    FetchTimeout,
    FetchHttp4xx,
    FetchHttp5xx,
    FetchNetworkError,
    FetchSslError,
    FetchTooLarge,
    ParseXmlError,
    ParseJsonError,
    ParseHtmlError,
    ParseSchemaError,
    ParseNoItems,
    DatesMissingNoOrdering,
    StatusOnlySource,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::FetchParseOkHasNew => "FETCH_PARSE_OK_HAS_NEW",
            ReasonCode::FetchParseOkHasUpdated => "FETCH_PARSE_OK_HAS_UPDATED",
            ReasonCode::FetchParseOkNoDelta => "FETCH_PARSE_OK_NO_DELTA",
            ReasonCode::FetchTimeout => "FETCH_TIMEOUT",
            ReasonCode::FetchHttp4xx => "FETCH_HTTP_4XX",
            ReasonCode::FetchHttp5xx => "FETCH_HTTP_5XX",
            ReasonCode::FetchNetworkError => "FETCH_NETWORK_ERROR",
            ReasonCode::FetchSslError => "FETCH_SSL_ERROR",
            ReasonCode::FetchTooLarge => "FETCH_TOO_LARGE",
            ReasonCode::ParseXmlError => "PARSE_XML_ERROR",
            ReasonCode::ParseJsonError => "PARSE_JSON_ERROR",
            ReasonCode::ParseHtmlError => "PARSE_HTML_ERROR",
            ReasonCode::ParseSchemaError => "PARSE_SCHEMA_ERROR",
            ReasonCode::ParseNoItems => "PARSE_NO_ITEMS",
            ReasonCode::DatesMissingNoOrdering => "DATES_MISSING_NO_ORDERING",
            ReasonCode::StatusOnlySource => "STATUS_ONLY_SOURCE",
        }
    }

    /// A default human-readable sentence for this reason, used when no
    /// more specific message is available.
    pub fn reason_text(&self) -> &'static str {
        match self {
            ReasonCode::FetchParseOkHasNew => "Fetched and parsed successfully; new items found.",
            ReasonCode::FetchParseOkHasUpdated => "Fetched and parsed successfully; existing items updated.",
            ReasonCode::FetchParseOkNoDelta => "Fetched and parsed successfully; no changes since last run.",
            ReasonCode::FetchTimeout => "The request timed out before a response was received.",
            ReasonCode::FetchHttp4xx => "The server rejected the request (client error).",
            ReasonCode::FetchHttp5xx => "The server failed to handle the request (server error).",
            ReasonCode::FetchNetworkError => "A network-level error prevented the request from completing.",
            ReasonCode::FetchSslError => "TLS/certificate verification failed.",
            ReasonCode::FetchTooLarge => "The response exceeded the configured size limit.",
            ReasonCode::ParseXmlError => "The response could not be parsed as XML/Atom/RSS.",
            ReasonCode::ParseJsonError => "The response could not be parsed as JSON.",
            ReasonCode::ParseHtmlError => "The response could not be parsed as HTML.",
            ReasonCode::ParseSchemaError => "The response did not match the expected schema.",
            ReasonCode::ParseNoItems => "The response parsed successfully but contained no items.",
            ReasonCode::DatesMissingNoOrdering => "Items lack reliable publish dates; ordering may be approximate.",
            ReasonCode::StatusOnlySource => "This source is status-only and contributes no items.",
        }
    }

    /// An actionable remediation hint, when one exists for this reason.
    pub fn remediation_hint(&self) -> Option<&'static str> {
        match self {
            ReasonCode::FetchTimeout => Some("Check the source's availability or increase its per-request timeout."),
            ReasonCode::FetchHttp4xx => Some("Verify the source URL and any required authentication token."),
            ReasonCode::FetchHttp5xx => Some("The upstream service may be degraded; retry later."),
            ReasonCode::FetchSslError => Some("Check the source's TLS certificate chain."),
            ReasonCode::FetchTooLarge => Some("Raise max_response_size_bytes if this source's feed is expected to grow."),
            ReasonCode::ParseSchemaError => Some("Confirm the source's API response shape has not changed."),
            ReasonCode::ParseNoItems => Some("Confirm the source still publishes items at the configured URL."),
            ReasonCode::DatesMissingNoOrdering => Some("Add a date-extraction rule for this source's markup."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_round_trips_through_serde() {
        let code = ReasonCode::FetchHttp4xx;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"FETCH_HTTP_4XX\"");
        assert_eq!(code.as_str(), "FETCH_HTTP_4XX");
    }

    #[test]
    fn remediation_hint_present_only_for_actionable_reasons() {
        assert!(ReasonCode::FetchHttp4xx.remediation_hint().is_some());
        assert!(ReasonCode::FetchParseOkHasNew.remediation_hint().is_none());
    }
}
