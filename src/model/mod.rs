//! Unified in-memory structure shared by the HWP5 and HWPX readers.
//!
//! A [`StructureModel`] is an ordered sequence of [`Block`]s. Tables own a
//! list of cells, each holding its own block sequence, so nested tables are
//! plain recursion. Tables found inside a paragraph are placed as separate
//! blocks right after that paragraph.
//!
//! Footnote, endnote and memo bodies as well as hyperlink targets live in
//! side tables; runs reference them through [`Anchor`] indices, so the
//! document order of anchors is the extraction order.

mod annotation;
mod node;
mod path;

pub use annotation::{MemoBody, NoteBody, NoteType};
pub use node::{Anchor, Block, Cell, Paragraph, Run, Table, TextOrigin};
pub use path::NodePath;

pub(crate) use node::{CellDraft, for_each_paragraph_mut, for_each_run};

use std::sync::atomic::{AtomicU64, Ordering};

/// Table ids are drawn process-wide so no two parsed models share one.
static NEXT_TABLE_UID: AtomicU64 = AtomicU64::new(1);

/// Parsed document structure.
#[derive(Debug, Clone, Default)]
pub struct StructureModel {
    pub(crate) blocks: Vec<Block>,
    pub(crate) notes: Vec<NoteBody>,
    pub(crate) links: Vec<String>,
    pub(crate) memos: Vec<MemoBody>,
    generation: u64,
}

impl StructureModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Footnote and endnote bodies in anchor order.
    pub fn notes(&self) -> &[NoteBody] {
        &self.notes
    }

    pub fn memos(&self) -> &[MemoBody] {
        &self.memos
    }

    /// Target of the hyperlink with the given anchor index.
    pub fn link_target(&self, index: usize) -> Option<&str> {
        self.links.get(index).map(String::as_str)
    }

    /// Counter bumped by every text edit.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether any run has been edited since parsing.
    pub fn is_dirty(&self) -> bool {
        self.generation > 0
    }

    pub(crate) fn touch(&mut self) {
        self.generation += 1;
    }

    /// Id for a newly parsed table, unique across every model in the process.
    ///
    /// Clones keep their tables' ids, which is sound as long as no edit
    /// changes table structure.
    pub(crate) fn next_table_uid(&mut self) -> u64 {
        NEXT_TABLE_UID.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn push_note(&mut self, body: NoteBody) -> usize {
        self.notes.push(body);
        self.notes.len() - 1
    }

    pub(crate) fn push_link(&mut self, target: String) -> usize {
        self.links.push(target);
        self.links.len() - 1
    }

    pub(crate) fn push_memo(&mut self, body: MemoBody) -> usize {
        self.memos.push(body);
        self.memos.len() - 1
    }

    /// Resolve a path to a block.
    pub fn block(&self, path: &NodePath) -> Option<&Block> {
        let (first, rest) = path.indices().split_first()?;
        let mut block = self.blocks.get(*first)?;
        for step in rest.chunks(2) {
            let [cell, index] = step else {
                return None;
            };
            let Block::Table(table) = block else {
                return None;
            };
            block = table.cells.get(*cell)?.blocks.get(*index)?;
        }
        Some(block)
    }

    pub(crate) fn block_mut(&mut self, path: &NodePath) -> Option<&mut Block> {
        let (first, rest) = path.indices().split_first()?;
        let mut block = self.blocks.get_mut(*first)?;
        for step in rest.chunks(2) {
            let [cell, index] = step else {
                return None;
            };
            let Block::Table(table) = block else {
                return None;
            };
            block = table.cells.get_mut(*cell)?.blocks.get_mut(*index)?;
        }
        Some(block)
    }

    /// Resolve a path to a table.
    pub fn table(&self, path: &NodePath) -> Option<&Table> {
        self.block(path).and_then(Block::as_table)
    }

    /// Every edited run with its origin, including runs in annotation bodies.
    pub(crate) fn edited_runs(&self) -> Vec<(TextOrigin, &str)> {
        let mut edits = Vec::new();
        let bodies = std::iter::once(self.blocks.as_slice())
            .chain(self.notes.iter().map(|note| note.blocks.as_slice()))
            .chain(self.memos.iter().map(|memo| memo.blocks.as_slice()));
        for blocks in bodies {
            for_each_run(blocks, &mut |run| {
                if let (true, Some(origin)) = (run.edited, run.origin) {
                    edits.push((origin, run.text.as_str()));
                }
            });
        }
        edits
    }
}
