//! Unified HWP document module.
//!
//! This module provides one API over both Hangul word processor formats:
//! the HWP5 compound binary file (.hwp) and the HWPX zip package (.hwpx).
//! The format is taken from the extension, confirmed from the content
//! signature, and then handled transparently.
//!
//! # Architecture
//!
//! - `Document`: owns the source bytes and the parsed [`StructureModel`]
//! - [`TableManager`]: grid access to tables, borrowed from the document
//! - [`TextReplacer`]: in-place text transforms, borrowed from the document
//!
//! A document built from a path is loaded lazily: [`Document::new`] only
//! validates the extension, and the file is read on first use.
//!
//! # Example
//!
//! ```rust,no_run
//! use hanji::Document;
//! use hanji::replace::Scope;
//!
//! let mut doc = Document::open("report.hwpx")?;
//! println!("{}", doc.extract_text()?);
//!
//! let changed = doc.replace_all_texts(|s| s.replace("2023", "2024"), Scope::ALL)?;
//! if changed > 0 {
//!     doc.save("report-2024.hwpx")?;
//! }
//! # Ok::<(), hanji::Error>(())
//! ```

use crate::common::detection::{detect_format_from_extension, resolve_format};
use crate::common::{DocumentType, Error, Result};
use crate::extract::{self, ExtractOptions, ExtractResult, MemoData, NoteData};
use crate::model::StructureModel;
use crate::replace::{Scope, TextReplacer};
use crate::table::{TableHandle, TableManager};
use once_cell::unsync::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "hwp5")]
use crate::hwp5;
#[cfg(feature = "hwpx")]
use crate::hwpx;


/// Format-specific state kept for writing the document back.
enum SourceImpl {
    #[cfg(feature = "hwp5")]
    Hwp5(Box<hwp5::Hwp5Source>),
    #[cfg(feature = "hwpx")]
    Hwpx(Box<hwpx::HwpxSource>),
}

struct Loaded {
    model: StructureModel,
    source: SourceImpl,
}

/// An HWP or HWPX document.
///
/// This is the main entry point. Use [`Document::open`] for files,
/// [`Document::from_bytes`] for in-memory data and [`Document::blank`] for a
/// new empty document.
pub struct Document {
    path: Option<PathBuf>,
    doc_type: DocumentType,
    /// Parsed model; empty until first use for path-backed documents
    loaded: OnceCell<Loaded>,
    blank: bool,
}

impl Document {
    /// Create a path-backed document without touching the file system.
    ///
    /// Fails with `UnsupportedFormat` unless the extension is `.hwp` or
    /// `.hwpx`. A missing file is only reported once content is needed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hanji::Document;
    ///
    /// assert!(Document::new("/no/such/dir/report.hwp").is_ok());
    /// assert!(Document::new("notes.txt").unwrap_err().is_unsupported_format());
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc_type = detect_format_from_extension(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            doc_type,
            loaded: OnceCell::new(),
            blank: false,
        })
    }

    /// Create a document and load it immediately.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = Self::new(path)?;
        doc.loaded()?;
        Ok(doc)
    }

    /// Parse a document held in memory.
    ///
    /// The type comes from the content signature. A `declared` type that
    /// contradicts it fails with `UnsupportedFormat`.
    pub fn from_bytes(bytes: Vec<u8>, declared: Option<DocumentType>) -> Result<Self> {
        let doc_type = resolve_format(declared, &bytes)?;
        let loaded = parse(doc_type, bytes)?;
        Ok(Self {
            path: None,
            doc_type,
            loaded: OnceCell::with_value(loaded),
            blank: false,
        })
    }

    /// A new document holding one empty paragraph.
    pub fn blank(doc_type: DocumentType) -> Result<Self> {
        let bytes = blank_bytes(doc_type)?;
        let mut doc = Self::from_bytes(bytes, Some(doc_type))?;
        doc.blank = true;
        Ok(doc)
    }

    #[inline]
    pub fn document_type(&self) -> DocumentType {
        self.doc_type
    }

    /// Source path, `None` for in-memory documents.
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the document differs from its source: a blank document, or
    /// one with edited text.
    pub fn is_modified(&self) -> bool {
        self.blank || self.loaded.get().is_some_and(|l| l.model.is_dirty())
    }

    /// Whether the content has been read and parsed.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// The parsed structure, loading it on first use.
    pub fn model(&self) -> Result<&StructureModel> {
        Ok(&self.loaded()?.model)
    }

    pub fn model_mut(&mut self) -> Result<&mut StructureModel> {
        self.loaded()?;
        self.loaded
            .get_mut()
            .map(|loaded| &mut loaded.model)
            .ok_or_else(|| Error::CorruptDocument("document model unavailable".to_string()))
    }

    fn loaded(&self) -> Result<&Loaded> {
        self.loaded.get_or_try_init(|| {
            let path = self.path.as_deref().ok_or_else(|| {
                Error::CorruptDocument("in-memory document has no model".to_string())
            })?;
            let bytes = std::fs::read(path).map_err(|e| Error::from_open(e, path))?;
            let doc_type = resolve_format(Some(self.doc_type), &bytes)?;
            log::debug!("loading {} ({} bytes)", path.display(), bytes.len());
            parse(doc_type, bytes)
        })
    }

    /// Plain text of the body with default separators.
    pub fn extract_text(&self) -> Result<String> {
        self.extract_text_with(&ExtractOptions::default())
    }

    pub fn extract_text_with(&self, options: &ExtractOptions) -> Result<String> {
        Ok(extract::extract_text(self.model()?, options))
    }

    /// Text plus footnotes, endnotes, hyperlinks and memos from one pass.
    pub fn extract_text_with_notes(&self) -> Result<ExtractResult> {
        Ok(extract::extract_all(self.model()?, &ExtractOptions::default()))
    }

    pub fn footnotes(&self) -> Result<Vec<NoteData>> {
        Ok(extract::footnotes(self.model()?))
    }

    pub fn endnotes(&self) -> Result<Vec<NoteData>> {
        Ok(extract::endnotes(self.model()?))
    }

    /// `(text, url)` pairs in anchor order.
    pub fn hyperlinks(&self) -> Result<Vec<(String, String)>> {
        Ok(extract::hyperlinks(self.model()?)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub fn memos(&self) -> Result<Vec<MemoData>> {
        Ok(extract::memos(self.model()?))
    }

    pub fn table_manager(&mut self) -> Result<TableManager<'_>> {
        Ok(TableManager::new(self.model_mut()?))
    }

    /// Handles for the document's tables. See [`TableManager::get_all_tables`].
    pub fn tables(&mut self, include_nested: bool) -> Result<Vec<TableHandle>> {
        Ok(self.table_manager()?.get_all_tables(include_nested))
    }

    /// Apply `transform` to every editable run in `scope`.
    ///
    /// Returns the number of runs whose text changed.
    pub fn replace_all_texts<F>(&mut self, transform: F, scope: Scope) -> Result<usize>
    where
        F: FnMut(&str) -> String,
    {
        Ok(TextReplacer::new(self.model_mut()?).replace_all(transform, scope))
    }

    /// Apply `transform` to table-cell text only.
    pub fn replace_table_texts<F>(&mut self, transform: F) -> Result<usize>
    where
        F: FnMut(&str) -> String,
    {
        self.replace_all_texts(transform, Scope::TABLE)
    }

    /// Serialize into the document's own container format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let loaded = self.loaded()?;
        match &loaded.source {
            #[cfg(feature = "hwp5")]
            SourceImpl::Hwp5(source) => Ok(hwp5::write(source, &loaded.model)?),
            #[cfg(feature = "hwpx")]
            SourceImpl::Hwpx(source) => hwpx::write(source, &loaded.model),
        }
    }

    /// Write the document to `path`.
    ///
    /// The target extension must name the document's own format; converting
    /// between HWP and HWPX is not supported.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match detect_format_from_extension(path) {
            Ok(target) if target == self.doc_type => {},
            _ => {
                return Err(Error::UnsupportedWrite(format!(
                    "cannot save a .{} document as {}",
                    self.doc_type,
                    path.display()
                )));
            },
        }

        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        log::debug!("saved {}", path.display());
        Ok(())
    }

    /// Release the source and the parsed model.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        if self.loaded.take().is_some() {
            log::trace!("released {}", DisplayPath(self.path.as_deref()));
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Document(path={}, type={}, modified={})",
            DisplayPath(self.path.as_deref()),
            self.doc_type,
            self.is_modified()
        )
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("doc_type", &self.doc_type)
            .field("loaded", &self.is_loaded())
            .field("modified", &self.is_modified())
            .finish()
    }
}

struct DisplayPath<'a>(Option<&'a Path>);

impl fmt::Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, "{}", path.display()),
            None => f.write_str("<memory>"),
        }
    }
}

fn parse(doc_type: DocumentType, bytes: Vec<u8>) -> Result<Loaded> {
    match doc_type {
        DocumentType::Hwp => parse_hwp5(bytes),
        DocumentType::Hwpx => parse_hwpx(bytes),
    }
}

#[cfg(feature = "hwp5")]
fn parse_hwp5(bytes: Vec<u8>) -> Result<Loaded> {
    let (model, source) = hwp5::read(bytes)?;
    Ok(Loaded {
        model,
        source: SourceImpl::Hwp5(Box::new(source)),
    })
}

#[cfg(not(feature = "hwp5"))]
fn parse_hwp5(_bytes: Vec<u8>) -> Result<Loaded> {
    Err(Error::FeatureDisabled("hwp5".to_string()))
}

#[cfg(feature = "hwpx")]
fn parse_hwpx(bytes: Vec<u8>) -> Result<Loaded> {
    let (model, source) = hwpx::read(bytes)?;
    Ok(Loaded {
        model,
        source: SourceImpl::Hwpx(Box::new(source)),
    })
}

#[cfg(not(feature = "hwpx"))]
fn parse_hwpx(_bytes: Vec<u8>) -> Result<Loaded> {
    Err(Error::FeatureDisabled("hwpx".to_string()))
}

fn blank_bytes(doc_type: DocumentType) -> Result<Vec<u8>> {
    match doc_type {
        #[cfg(feature = "hwp5")]
        DocumentType::Hwp => Ok(hwp5::blank()?),
        #[cfg(feature = "hwpx")]
        DocumentType::Hwpx => hwpx::blank(),
        #[allow(unreachable_patterns)]
        other => Err(Error::FeatureDisabled(match other {
            DocumentType::Hwp => "hwp5".to_string(),
            DocumentType::Hwpx => "hwpx".to_string(),
        })),
    }
}
