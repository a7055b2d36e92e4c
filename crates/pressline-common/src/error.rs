use thiserror::Error;

/// Errors raised constructing or validating configuration values.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} out of bounds: {detail}")]
    OutOfBounds { field: String, detail: String },

    #[error("source {source_id} sets forbidden header {header}")]
    ForbiddenHeader { source_id: String, header: String },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Errors raised constructing domain model values outside of config.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid tier: {0}")]
    InvalidTier(String),

    #[error("unknown content kind: {0}")]
    UnknownContentKind(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
