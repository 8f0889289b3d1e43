use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Invalid root path: {0}")]
    InvalidRoot(String),

    #[error("{0}")]
    Other(String),
}
