use thiserror::Error;

use crate::state::IllegalTransition;

#[derive(Error, Debug)]
pub enum RankError {
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
