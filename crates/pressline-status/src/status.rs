use chrono::{DateTime, Utc};
use pressline_collect::ParseErrorClass;
use pressline_common::{SourceStatus, SourceStatusCode};
use pressline_fetch::FetchErrorClass;

use crate::mapping::{map_fetch_error_to_reason_code, map_parse_error_to_reason_code};
use crate::reason_code::ReasonCode;

/// Everything needed to classify one source's outcome, independent of how
/// the collector actually represents it internally.
pub struct SourceOutcomeView<'a> {
    pub source_id: &'a str,
    pub name: &'a str,
    pub tier: u8,
    pub method: &'a str,
    pub category: Option<&'a str>,
    pub succeeded: bool,
    pub status_only: bool,
    pub fetch_error_class: Option<FetchErrorClass>,
    pub parse_error_class: Option<ParseErrorClass>,
    pub parse_error_message: Option<&'a str>,
    pub last_fetch_status_code: Option<u16>,
    pub items_new: u32,
    pub items_updated: u32,
    pub newest_item_date: Option<DateTime<Utc>>,
    pub dates_all_low_confidence: bool,
}

/// Classifies a source outcome into a [`SourceStatus`], choosing a status
/// code and reason code by the same precedence as the upstream status
/// computer: status-only sources short-circuit first, then failures, then
/// the has-new/has-updated/no-delta split for successes.
pub fn compute_source_status(view: &SourceOutcomeView<'_>) -> SourceStatus {
    let (status, reason_code) = if view.status_only {
        (SourceStatusCode::StatusOnly, ReasonCode::StatusOnlySource)
    } else if !view.succeeded {
        let status = if view.parse_error_message.is_some() {
            SourceStatusCode::ParseFailed
        } else {
            SourceStatusCode::FetchFailed
        };
        let reason = if let Some(parse_class) = view.parse_error_class {
            map_parse_error_to_reason_code(parse_class)
        } else {
            view.fetch_error_class
                .map(map_fetch_error_to_reason_code)
                .unwrap_or(ReasonCode::FetchNetworkError)
        };
        (status, reason)
    } else if view.dates_all_low_confidence && (view.items_new > 0 || view.items_updated > 0) {
        (SourceStatusCode::CannotConfirm, ReasonCode::DatesMissingNoOrdering)
    } else if view.items_new > 0 {
        (SourceStatusCode::HasUpdate, ReasonCode::FetchParseOkHasNew)
    } else if view.items_updated > 0 {
        (SourceStatusCode::HasUpdate, ReasonCode::FetchParseOkHasUpdated)
    } else {
        (SourceStatusCode::NoUpdate, ReasonCode::FetchParseOkNoDelta)
    };

    SourceStatus {
        source_id: view.source_id.to_string(),
        name: view.name.to_string(),
        tier: view.tier,
        method: view.method.to_string(),
        status,
        reason_code: reason_code.as_str().to_string(),
        reason_text: reason_code.reason_text().to_string(),
        remediation_hint: reason_code.remediation_hint().map(str::to_string),
        newest_item_date: view.newest_item_date,
        last_fetch_status_code: view.last_fetch_status_code,
        items_new: view.items_new,
        items_updated: view.items_updated,
        category: view.category.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_view() -> SourceOutcomeView<'static> {
        SourceOutcomeView {
            source_id: "blog-a",
            name: "Blog A",
            tier: 0,
            method: "rss",
            category: None,
            succeeded: true,
            status_only: false,
            fetch_error_class: None,
            parse_error_class: None,
            parse_error_message: None,
            last_fetch_status_code: Some(200),
            items_new: 0,
            items_updated: 0,
            newest_item_date: None,
            dates_all_low_confidence: false,
        }
    }

    #[test]
    fn status_only_source_short_circuits() {
        let mut view = base_view();
        view.status_only = true;
        let status = compute_source_status(&view);
        assert_eq!(status.status, SourceStatusCode::StatusOnly);
        assert_eq!(status.reason_code, "STATUS_ONLY_SOURCE");
    }

    #[test]
    fn fetch_failure_maps_through_error_class() {
        let mut view = base_view();
        view.succeeded = false;
        view.fetch_error_class = Some(FetchErrorClass::Http5xx);
        let status = compute_source_status(&view);
        assert_eq!(status.status, SourceStatusCode::FetchFailed);
        assert_eq!(status.reason_code, "FETCH_HTTP_5XX");
    }

    #[test]
    fn parse_failure_maps_through_parse_error_class_not_fetch_class() {
        let mut view = base_view();
        view.succeeded = false;
        view.parse_error_message = Some("schema mismatch");
        view.parse_error_class = Some(ParseErrorClass::Schema);
        let status = compute_source_status(&view);
        assert_eq!(status.status, SourceStatusCode::ParseFailed);
        assert_eq!(status.reason_code, "PARSE_SCHEMA_ERROR");
    }

    #[test]
    fn new_items_yield_has_update_with_new_reason() {
        let mut view = base_view();
        view.items_new = 3;
        let status = compute_source_status(&view);
        assert_eq!(status.status, SourceStatusCode::HasUpdate);
        assert_eq!(status.reason_code, "FETCH_PARSE_OK_HAS_NEW");
    }

    #[test]
    fn no_changes_yields_no_update() {
        let status = compute_source_status(&base_view());
        assert_eq!(status.status, SourceStatusCode::NoUpdate);
        assert_eq!(status.reason_code, "FETCH_PARSE_OK_NO_DELTA");
    }
}
