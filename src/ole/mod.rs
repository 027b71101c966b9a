//! Compound binary file container.
//!
//! HWP5 documents are compound files ("structured storage"): a FAT-based
//! filesystem holding named streams such as `FileHeader`, `DocInfo` and
//! `BodyText/Section0`. This module reads streams out of such a container
//! and writes a new container from a set of streams.

/// Constants for the compound file format
pub mod consts;

/// Container reader
mod file;

/// Container writer
pub mod writer;

pub use file::{DirectoryEntry, OleError, OleFile, is_ole_file};
pub use writer::OleWriter;
