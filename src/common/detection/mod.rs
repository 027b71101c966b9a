//! File format detection utilities.
//!
//! Detection is based on file signatures (magic numbers) and container
//! structure, reading only the data required for identification. Extension
//! rules are checked separately so a path can be rejected before the file
//! system is touched.

// Submodule declarations
pub mod functions;
pub mod types;
pub mod utils;

// Re-exports
pub use functions::{
    detect_file_format, detect_format_from_bytes, detect_format_from_extension,
    detect_format_from_reader, resolve_format,
};
pub use types::DocumentType;
