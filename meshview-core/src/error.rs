//! Error types for meshview

use thiserror::Error;

/// Main error type for meshview operations
///
/// I/O failures and parse failures are separate variants so that callers can
/// tell an unreadable file apart from a malformed one.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Visualization error: {0}")]
    Visualization(String),
}

impl Error {
    /// Returns true if this error came from the filesystem rather than from
    /// interpreting file contents.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Returns true if this error came from malformed mesh data.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_))
    }
}
