use thiserror::Error;

/// Failure of a secondary tier operation. These never reach callers of
/// [`crate::CacheService`]; the service logs them and moves on.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode record: {0}")]
    Serialization(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),
    #[error("invalid cache configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
