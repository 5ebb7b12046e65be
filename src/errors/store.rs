use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Invalid JSON in {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("Failed to serialize {path}: {source}")]
    Serialize { path: PathBuf, source: serde_json::Error },
}

pub type StoreResult<T> = Result<T, StoreError>;
