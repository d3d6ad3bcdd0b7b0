use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Indexer error: {0}")]
    Indexer(#[from] lexmap_indexer::IndexerError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Target file not indexed: {0}")]
    TargetNotIndexed(String),

    #[error("Index not built yet")]
    IndexNotBuilt,
}

pub type Result<T> = std::result::Result<T, ContextError>;
