pub mod mapping;
pub mod reason_code;
pub mod status;

pub use mapping::{map_fetch_error_to_reason_code, map_http_status_to_reason_code, map_parse_error_to_reason_code};
pub use reason_code::ReasonCode;
pub use status::{compute_source_status, SourceOutcomeView};
