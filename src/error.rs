use zarrs::{
    array::{ArrayCreateError, ArrayError},
    storage::StorageError,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("mask array {mask_path} and source array {source_path} are the same (pattern={pattern})")]
    PathCollision {
        source_path: String,
        mask_path: String,
        pattern: String,
    },
    #[error("array {0} already exists")]
    TargetExists(String),
    #[error("node {0} exists but is not an array")]
    TargetNotArray(String),
    #[error("source array {0} does not exist")]
    SourceNotFound(String),
    #[error("source {0} is a group, not an array")]
    SourceNotArray(String),
    #[error("invalid mask pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid node path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("at least one zero value is required")]
    EmptyZeroValues,
    #[error("array {path} has unsupported data type {data_type}")]
    UnsupportedDataType { path: String, data_type: String },
    #[error("{0}")]
    General(String),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    ArrayCreate(#[from] ArrayCreateError),
    #[error(transparent)]
    Array(#[from] ArrayError),
    #[error(transparent)]
    Wrapped(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }

    pub fn wrap(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Wrapped(Box::new(error))
    }
}
