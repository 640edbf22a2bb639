//! Core error types for the herbarium importer

use thiserror::Error;

/// Main error type for herbarium operations
#[derive(Error, Debug)]
pub enum HerbariumError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unresolved reference: {0}")]
    Unresolved(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias for herbarium operations
pub type HerbariumResult<T> = Result<T, HerbariumError>;

impl From<anyhow::Error> for HerbariumError {
    fn from(err: anyhow::Error) -> Self {
        HerbariumError::Other(err.to_string())
    }
}
