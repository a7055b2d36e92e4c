//! Pure mapping functions from collector/fetch error classes to a
//! [`ReasonCode`]. Grounded on the upstream error mapper, but simplified:
//! the Rust collector and fetch layers already carry a typed error class
//! (`FetchErrorClass`, `ParseErrorClass`) rather than a free-text message,
//! so these are straight lookups instead of substring sniffing.

use pressline_collect::ParseErrorClass;
use pressline_fetch::FetchErrorClass;

use crate::reason_code::ReasonCode;

pub fn map_fetch_error_to_reason_code(error_class: FetchErrorClass) -> ReasonCode {
    match error_class {
        FetchErrorClass::NetworkTimeout => ReasonCode::FetchTimeout,
        FetchErrorClass::SslError => ReasonCode::FetchSslError,
        FetchErrorClass::ResponseSizeExceeded => ReasonCode::FetchTooLarge,
        FetchErrorClass::Http4xx => ReasonCode::FetchHttp4xx,
        FetchErrorClass::Http5xx => ReasonCode::FetchHttp5xx,
        FetchErrorClass::ConnectionError | FetchErrorClass::RateLimited | FetchErrorClass::Unknown => ReasonCode::FetchNetworkError,
    }
}

pub fn map_http_status_to_reason_code(status_code: Option<u16>) -> ReasonCode {
    match status_code {
        Some(code) if (400..500).contains(&code) => ReasonCode::FetchHttp4xx,
        Some(code) if (500..600).contains(&code) => ReasonCode::FetchHttp5xx,
        _ => ReasonCode::FetchNetworkError,
    }
}

pub fn map_parse_error_to_reason_code(error_class: ParseErrorClass) -> ReasonCode {
    match error_class {
        ParseErrorClass::Xml => ReasonCode::ParseXmlError,
        ParseErrorClass::Json => ReasonCode::ParseJsonError,
        ParseErrorClass::Html => ReasonCode::ParseHtmlError,
        ParseErrorClass::Schema => ReasonCode::ParseSchemaError,
        ParseErrorClass::NoItems => ReasonCode::ParseNoItems,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_class_maps_to_fetch_timeout() {
        assert_eq!(map_fetch_error_to_reason_code(FetchErrorClass::NetworkTimeout), ReasonCode::FetchTimeout);
    }

    #[test]
    fn status_boundaries_split_4xx_5xx() {
        assert_eq!(map_http_status_to_reason_code(Some(404)), ReasonCode::FetchHttp4xx);
        assert_eq!(map_http_status_to_reason_code(Some(503)), ReasonCode::FetchHttp5xx);
        assert_eq!(map_http_status_to_reason_code(Some(200)), ReasonCode::FetchNetworkError);
        assert_eq!(map_http_status_to_reason_code(None), ReasonCode::FetchNetworkError);
    }

    #[test]
    fn schema_class_maps_to_parse_schema_error() {
        assert_eq!(map_parse_error_to_reason_code(ParseErrorClass::Schema), ReasonCode::ParseSchemaError);
    }
}
