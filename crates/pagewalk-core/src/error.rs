//! Error types for all pagewalk operations.

use thiserror::Error;

/// Top-level error type for pagewalk operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A page request that cannot be executed as written.
///
/// These are raised before any range scan is issued.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{side} index key has {len} values but index '{index}' has only {fields} fields")]
    KeyTooLong {
        side: &'static str,
        index: String,
        len: usize,
        fields: usize,
    },

    #[error("start index key is past the end index key for a {order} scan")]
    InvertedBounds { order: &'static str },

    #[error("a schema is required to resolve the fields of index '{index}'")]
    MissingSchema { index: String },

    #[error("malformed range: {0}")]
    MalformedRange(String),
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table not found in schema: {0}")]
    TableNotFound(String),

    #[error("index '{index}' not found on table '{table}'")]
    IndexNotFound { table: String, index: String },

    #[error("index '{index}' already exists on table '{table}'")]
    DuplicateIndex { table: String, index: String },

    #[error("index name '{0}' is reserved")]
    ReservedIndexName(String),

    #[error("table already exists: {0}")]
    TableAlreadyExists(String),
}

/// Failures reported by a range-scan executor.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("index '{index}' not found on table '{table}'")]
    IndexNotFound { table: String, index: String },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("range does not match index '{index}': {reason}")]
    InvalidRange { index: String, reason: String },

    #[error("document already exists: {0}")]
    DuplicateId(String),

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("malformed cursor: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid pagination config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("default index name must not be empty")]
    EmptyIndexName,
}

pub type Result<T> = std::result::Result<T, Error>;
