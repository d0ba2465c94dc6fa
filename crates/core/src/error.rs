use thiserror::Error;

#[derive(Debug, Error)]
pub enum TracelabError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("sink error: {0}")]
    Sink(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("demo failure: {0}")]
    Demo(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, TracelabError>;
