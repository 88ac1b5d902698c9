//! Error types for the predchart pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the predchart pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unparseable timestamp, or a required column is absent.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Actual and predicted series share a field name.
    #[error("Schema conflict: {0}")]
    SchemaConflict(String),

    /// Chart artifact could not be produced.
    #[error("Render error: {0}")]
    Render(String),

    /// The data source has no table with the requested name.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Database backend error.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`], carried in pipeline reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Schema,
    SchemaConflict,
    Render,
    TableNotFound,
    Database,
    Config,
    Io,
    Json,
    Other,
}

impl Error {
    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }

    /// Create a schema conflict error.
    pub fn schema_conflict(msg: impl Into<String>) -> Self {
        Error::SchemaConflict(msg.into())
    }

    /// Create a render error.
    pub fn render(msg: impl Into<String>) -> Self {
        Error::Render(msg.into())
    }

    /// Create a table-not-found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound(name.into())
    }

    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Error::Database(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Schema(_) => ErrorKind::Schema,
            Error::SchemaConflict(_) => ErrorKind::SchemaConflict,
            Error::Render(_) => ErrorKind::Render,
            Error::TableNotFound(_) => ErrorKind::TableNotFound,
            Error::Database(_) => ErrorKind::Database,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Json,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether this error means the requested table does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::TableNotFound(_))
    }
}
