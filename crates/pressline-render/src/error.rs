use thiserror::Error;

use crate::state::IllegalTransition;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("io error writing {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
