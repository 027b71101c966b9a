//! Side tables for annotation bodies.
//!
//! Anchors in the body hold indices into these tables; the bodies themselves
//! are never part of the block tree.

use super::node::Block;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Footnote,
    Endnote,
}

impl NoteType {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteType::Footnote => "footnote",
            NoteType::Endnote => "endnote",
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a footnote or endnote.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteBody {
    pub kind: NoteType,
    /// Unique among notes of the same kind
    pub id: u32,
    pub(crate) blocks: Vec<Block>,
}

impl NoteBody {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

/// Body of a memo (comment).
#[derive(Debug, Clone, PartialEq)]
pub struct MemoBody {
    pub id: String,
    pub author: Option<String>,
    pub(crate) blocks: Vec<Block>,
}

impl MemoBody {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}
