//! Error types for proptree.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for archive operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Header present but the magic bytes are wrong
    #[error("Invalid archive buffer: expected \"PS\" magic bytes")]
    InvalidMagic,

    /// Unsupported wire format version
    #[error("Unsupported archive format version: {0}")]
    UnsupportedVersion(u8),

    /// Buffer is truncated
    #[error("Unexpected end of buffer at position {0}")]
    UnexpectedEof(usize),

    /// Invalid record or header layout
    #[error("Invalid buffer structure: {0}")]
    InvalidStructure(String),

    /// A present property holds a different type or shape than requested
    #[error("Type mismatch for property '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// Property exists but does not hold a nested object
    #[error("Property '{0}' is not an object")]
    NotAnObject(String),

    /// Element count does not fit in the configured count field
    #[error("Element count {count} exceeds the maximum of {max} for this encoding")]
    CountOverflow { count: usize, max: usize },

    /// Shape cannot be expressed by the selected codec
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse or write error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a type mismatch error for a named property.
    pub fn mismatch(
        name: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// True for errors caused by a present property of the wrong shape.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. } | Self::NotAnObject(_))
    }
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
