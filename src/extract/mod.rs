//! Text and annotation extraction.
//!
//! Every extractor is a [`Visitor`] over the model's body, run in document
//! order. The single-purpose functions ([`footnotes`], [`hyperlinks`], ...)
//! each walk the body once with one collector; [`extract_all`] feeds all
//! collectors from a single walk.
//!
//! Anchors are only looked up in the body (tables included). Annotation
//! bodies are reported as text.
//!
//! # Example
//!
//! ```no_run
//! use hanji::Document;
//! use hanji::extract::{self, ExtractOptions};
//!
//! # fn main() -> Result<(), hanji::Error> {
//! let doc = Document::open("report.hwpx")?;
//! let result = extract::extract_all(doc.model()?, &ExtractOptions::default());
//! println!("{} footnotes, {} links", result.footnotes.len(), result.hyperlinks.len());
//! # Ok(())
//! # }
//! ```

mod collectors;
mod config;
mod types;
mod visitor;


pub use crate::model::NoteType;
pub use collectors::{
    LinkCollector, MemoCollector, NoteCollector, Pipeline, TextCollector, blocks_text,
};
pub use config::ExtractOptions;
pub use types::{AnchorLocation, ExtractResult, Hyperlink, MemoData, NoteData};
pub use visitor::{Boundary, Visitor, walk};

use crate::model::StructureModel;

/// Plain text of the whole body.
pub fn extract_text(model: &StructureModel, options: &ExtractOptions) -> String {
    blocks_text(model.blocks(), options)
}

/// Text plus every annotation list from one traversal.
pub fn extract_all(model: &StructureModel, options: &ExtractOptions) -> ExtractResult {
    let mut pipeline = Pipeline::new(model, options);
    walk(model.blocks(), &mut pipeline);
    pipeline.finish()
}

/// Footnotes and endnotes in anchor order.
pub fn notes(model: &StructureModel) -> Vec<NoteData> {
    let options = ExtractOptions::default();
    let mut collector = NoteCollector::new(model, &options);
    walk(model.blocks(), &mut collector);
    collector.finish()
}

pub fn footnotes(model: &StructureModel) -> Vec<NoteData> {
    notes_of(model, NoteType::Footnote)
}

pub fn endnotes(model: &StructureModel) -> Vec<NoteData> {
    notes_of(model, NoteType::Endnote)
}

fn notes_of(model: &StructureModel, kind: NoteType) -> Vec<NoteData> {
    let mut notes = notes(model);
    notes.retain(|note| note.note_type == kind);
    notes
}

/// Hyperlinks in anchor order. Identical targets are not merged.
pub fn hyperlinks(model: &StructureModel) -> Vec<Hyperlink> {
    let mut collector = LinkCollector::new(model);
    walk(model.blocks(), &mut collector);
    collector.finish()
}

pub fn memos(model: &StructureModel) -> Vec<MemoData> {
    let options = ExtractOptions::default();
    let mut collector = MemoCollector::new(model, &options);
    walk(model.blocks(), &mut collector);
    collector.finish()
}
