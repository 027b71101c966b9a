//! Unified error types for hanji.
//!
//! This module provides a unified error type that encompasses errors from the
//! compound-file container, the HWP5 record stream and the HWPX package,
//! presenting a consistent API to users.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
