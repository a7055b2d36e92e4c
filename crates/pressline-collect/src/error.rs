use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorClass {
    Xml,
    Json,
    Html,
    Schema,
    NoItems,
}

#[derive(Error, Debug)]
#[error("{class:?}: {message}")]
pub struct ParseError {
    pub class: ParseErrorClass,
    pub message: String,
}

impl ParseError {
    pub fn new(class: ParseErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CollectError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unsupported content type for html/xml source: {0}")]
    UnsupportedContentType(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
