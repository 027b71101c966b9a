//! Unified error types for hanji.
//!
//! Callers must be able to tell a missing file from a wrong extension from
//! corrupt content, so each of those has its own variant.
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for hanji operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error other than a missing source file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unrecognized or contradictory extension, or an unknown content signature
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The source file does not exist at access time
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Structurally invalid binary or XML container
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// A table or node handle that no longer resolves to the node it was issued for
    #[error("Stale handle: {0}")]
    StaleHandle(String),

    /// Serialization requested for a format or path that cannot be written
    #[error("Unsupported write: {0}")]
    UnsupportedWrite(String),

    /// Caller supplied an argument outside the accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Feature disabled at compile time
    #[error("Feature '{0}' is disabled. Enable it with --features {0}")]
    FeatureDisabled(String),
}

impl Error {
    /// Map an I/O error raised while opening `path`, keeping `NotFound` distinct.
    pub(crate) fn from_open(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(path.to_path_buf())
        } else {
            Error::Io(err)
        }
    }

    /// Whether the error means the source file was missing.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether the error means the input is not an HWP/HWPX document.
    #[inline]
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Error::UnsupportedFormat(_))
    }

    /// Whether the error means the container is damaged.
    #[inline]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::CorruptDocument(_))
    }
}

/// Result type for hanji operations.
pub type Result<T> = std::result::Result<T, Error>;
