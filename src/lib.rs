//! Hanji - A Rust library for reading and editing Hangul word processor documents
//!
//! This library parses both HWP formats into one structure model and works
//! on that model independently of where it came from:
//!
//! - **HWP5**: the compound binary file (.hwp) with tagged record streams
//! - **HWPX**: the OWPML zip package (.hwpx) with XML section parts
//!
//! # Features
//!
//! - **Format detection**: extension rules checked against content signatures
//! - **Text extraction**: body text with configurable separators
//! - **Annotations**: footnotes, endnotes, hyperlinks and memos in anchor order
//! - **Tables**: logical-grid access with row and column spans
//! - **Replacement**: in-place text transforms by scope, written back by
//!   patching only the edited records or XML parts
//!
//! # Example - Extracting text and notes
//!
//! ```no_run
//! use hanji::Document;
//!
//! # fn main() -> Result<(), hanji::Error> {
//! let doc = Document::open("report.hwp")?;
//! let result = doc.extract_text_with_notes()?;
//!
//! println!("{}", result.text);
//! for note in &result.footnotes {
//!     println!("[{}] {}", note.id, note.text);
//! }
//! for link in &result.hyperlinks {
//!     println!("{} -> {}", link.text, link.url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Editing tables
//!
//! ```no_run
//! use hanji::Document;
//!
//! # fn main() -> Result<(), hanji::Error> {
//! let mut doc = Document::open("form.hwpx")?;
//! let mut tables = doc.table_manager()?;
//! if let Some(first) = tables.get_all_tables(false).first() {
//!     tables.set_cell_text(first, 0, 0, "Name")?;
//! }
//! doc.save("form-filled.hwpx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo features
//!
//! - `hwp5` (default): HWP5 reading and writing
//! - `hwpx` (default): HWPX reading and writing

pub mod common;

#[cfg(feature = "hwp5")]
pub mod ole;

#[cfg(feature = "hwp5")]
pub mod hwp5;

#[cfg(feature = "hwpx")]
pub mod hwpx;

pub mod document;
pub mod extract;
pub mod model;
pub mod replace;
pub mod table;

#[cfg(test)]
pub(crate) mod fixtures;

pub use common::{DocumentType, Error, Result};
pub use document::Document;
pub use extract::{ExtractOptions, ExtractResult, Hyperlink, MemoData, NoteData, NoteType};
pub use model::{NodePath, StructureModel};
pub use replace::{Scope, TextReplacer};
pub use table::{TableHandle, TableManager};
