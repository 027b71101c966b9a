//! Extraction result types.

use crate::model::{NodePath, NoteType};
use serde::{Deserialize, Serialize};

/// Where an annotation is anchored: the block path and the run index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorLocation {
    pub path: Vec<usize>,
    pub run: usize,
}

impl AnchorLocation {
    pub(crate) fn new(path: &NodePath, run: usize) -> Self {
        Self {
            path: path.to_vec(),
            run,
        }
    }

    /// Path of the paragraph holding the anchor.
    pub fn node_path(&self) -> NodePath {
        NodePath::from(self.path.as_slice())
    }
}

/// A footnote or endnote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteData {
    pub note_type: NoteType,
    /// Unique among notes of the same type
    pub id: u32,
    pub text: String,
    pub anchor: AnchorLocation,
}

/// Display text and target of one hyperlink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub text: String,
    pub url: String,
}

impl Hyperlink {
    /// `(text, url)` pair.
    pub fn into_pair(self) -> (String, String) {
        (self.text, self.url)
    }
}

impl From<Hyperlink> for (String, String) {
    fn from(link: Hyperlink) -> Self {
        link.into_pair()
    }
}

/// A memo (comment) and the place it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoData {
    pub id: String,
    pub text: String,
    pub author: Option<String>,
    pub anchor: AnchorLocation,
}

/// Text and every annotation list, captured in one traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResult {
    pub text: String,
    pub footnotes: Vec<NoteData>,
    pub endnotes: Vec<NoteData>,
    pub hyperlinks: Vec<Hyperlink>,
    pub memos: Vec<MemoData>,
}
