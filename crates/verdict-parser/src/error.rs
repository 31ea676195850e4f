//! Parser error types

use thiserror::Error;

/// Parser error
#[derive(Error, Debug)]
pub enum ParseError {
    /// XML syntax error from the underlying reader
    #[error("failed to parse DMN XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The document is not valid UTF-8
    #[error("DMN document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Structurally malformed document (missing root, truncated, ...)
    #[error("failed to parse DMN XML: {0}")]
    Malformed(String),
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;
