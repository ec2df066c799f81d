//! Error types for the highlighter

use thiserror::Error;

use crate::dom::DomError;
use crate::path::PathParseError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, HighlightError>;

/// Highlighter error type
#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Selection is collapsed")]
    CollapsedRange,

    #[error("Range boundaries are not in the document")]
    InvalidRange,

    #[error("Range touches no text")]
    EmptyText,

    #[error("Node is not addressable from body")]
    Unaddressable,

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid highlight id: {0}")]
    InvalidId(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Malformed path: {0}")]
    Path(#[from] PathParseError),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected for key {0}")]
    WriteRejected(String),

    #[error("Corrupt entry for key {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
