use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("group {0:?} produced no links, which should be impossible for a non-empty group")]
    EmptyGroup(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
