//! Error types for FieldQuote.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error came from the catalog or alias backend.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Database(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
