use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    FetchConfig(#[from] pressline_fetch::FetchConfigError),

    #[error(transparent)]
    Store(#[from] pressline_store::StoreError),

    #[error(transparent)]
    Link(#[from] pressline_link::LinkError),

    #[error(transparent)]
    Rank(#[from] pressline_rank::RankError),

    #[error(transparent)]
    Render(#[from] pressline_render::RenderError),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
