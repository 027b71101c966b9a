//! Common types and utilities shared by both document formats.

// Submodule declarations
pub mod binary;
pub mod detection;
pub mod error;
pub mod field;

// Re-exports for convenience
pub use detection::{DocumentType, detect_file_format, detect_format_from_bytes};
pub use error::{Error, Result};
