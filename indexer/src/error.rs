use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Ignore error: {0}")]
    Ignore(String),

    #[error("Worker task failed: {0}")]
    Join(String),
}

impl From<ignore::Error> for IndexerError {
    fn from(err: ignore::Error) -> Self {
        IndexerError::Ignore(err.to_string())
    }
}

impl From<tokio::task::JoinError> for IndexerError {
    fn from(err: tokio::task::JoinError) -> Self {
        IndexerError::Join(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
