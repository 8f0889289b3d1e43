use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ListingError>;

#[derive(Error, Debug)]
pub enum ListingError {
    #[error(transparent)]
    Path(#[from] dirview_protocol::PathError),

    #[error(transparent)]
    Policy(#[from] dirview_policy::PolicyError),

    #[error(transparent)]
    Indexer(#[from] dirview_indexer::IndexerError),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
