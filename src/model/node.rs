//! Block, run and table nodes.

use smallvec::SmallVec;
use std::collections::BTreeSet;

/// Where an editable run's text lives in the source container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrigin {
    /// UTF-16 units `start..start + len` of the `record`-th record in section `section`.
    Hwp5 {
        section: u32,
        record: u32,
        start: u32,
        len: u32,
    },
    /// Raw character-data bytes `start..end` of section part `part`.
    Hwpx { part: u32, start: usize, end: usize },
}

/// Annotation marker attached to a run.
///
/// The index points into the owning model's side table of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Note(usize),
    Hyperlink(usize),
    Memo(usize),
}

/// A stretch of text inside a paragraph.
///
/// Runs with an origin are editable: their text came from the source and can
/// be written back. Runs without one are synthetic (tabs, line breaks and
/// the empty marker runs that carry anchors).
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub(crate) text: String,
    pub(crate) anchors: SmallVec<[Anchor; 1]>,
    pub(crate) link: Option<usize>,
    pub(crate) origin: Option<TextOrigin>,
    pub(crate) edited: bool,
}

impl Run {
    pub(crate) fn editable(text: String, origin: TextOrigin) -> Self {
        Self {
            text,
            anchors: SmallVec::new(),
            link: None,
            origin: Some(origin),
            edited: false,
        }
    }

    pub(crate) fn fixed(text: &str) -> Self {
        Self {
            text: text.to_string(),
            anchors: SmallVec::new(),
            link: None,
            origin: None,
            edited: false,
        }
    }

    pub(crate) fn marker(anchor: Anchor) -> Self {
        let mut run = Self::fixed("");
        run.anchors.push(anchor);
        run
    }

    pub(crate) fn with_link(mut self, link: Option<usize>) -> Self {
        self.link = link;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Index of the hyperlink whose display text this run belongs to.
    pub fn link(&self) -> Option<usize> {
        self.link
    }

    pub fn origin(&self) -> Option<TextOrigin> {
        self.origin
    }

    pub fn is_editable(&self) -> bool {
        self.origin.is_some()
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    /// Replace the text of an editable run. Returns whether the text changed.
    pub(crate) fn set_text(&mut self, text: String) -> bool {
        if self.origin.is_none() || self.text == text {
            return false;
        }
        self.text = text;
        self.edited = true;
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub(crate) runs: Vec<Run>,
}

impl Paragraph {
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }

    pub(crate) fn push(&mut self, run: Run) {
        self.runs.push(run);
    }
}

/// One cell of a table, addressed on the logical grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: u16,
    pub col: u16,
    pub row_span: u16,
    pub col_span: u16,
    pub(crate) blocks: Vec<Block>,
}

impl Cell {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn covers(&self, row: usize, col: usize) -> bool {
        let (r, c) = (self.row as usize, self.col as usize);
        (r..r + self.row_span.max(1) as usize).contains(&row)
            && (c..c + self.col_span.max(1) as usize).contains(&col)
    }
}

/// Cell as read from the source, before missing addresses are assigned.
#[derive(Debug, Clone, Default)]
pub(crate) struct CellDraft {
    pub(crate) addr: Option<(u16, u16)>,
    pub(crate) span: (u16, u16),
    pub(crate) blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub(crate) uid: u64,
    pub(crate) rows: u16,
    pub(crate) cols: u16,
    pub(crate) cells: Vec<Cell>,
}

impl Table {
    /// Build a table, placing cells without an address on the first free slot
    /// in row-major order.
    pub(crate) fn from_drafts(uid: u64, rows: u16, cols: u16, drafts: Vec<CellDraft>) -> Self {
        let width = cols.max(1) as usize;
        let mut taken: BTreeSet<(usize, usize)> = BTreeSet::new();
        let mark = |taken: &mut BTreeSet<(usize, usize)>, r: u16, c: u16, span: (u16, u16)| {
            for dr in 0..span.0.max(1) as usize {
                for dc in 0..span.1.max(1) as usize {
                    taken.insert((r as usize + dr, c as usize + dc));
                }
            }
        };

        for draft in &drafts {
            if let Some((r, c)) = draft.addr {
                mark(&mut taken, r, c, draft.span);
            }
        }

        let mut cursor = 0usize;
        let mut cells = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let (row, col) = match draft.addr {
                Some(addr) => addr,
                None => {
                    while taken.contains(&(cursor / width, cursor % width)) {
                        cursor += 1;
                    }
                    let addr = ((cursor / width) as u16, (cursor % width) as u16);
                    mark(&mut taken, addr.0, addr.1, draft.span);
                    addr
                }
            };
            cells.push(Cell {
                row,
                col,
                row_span: draft.span.0.max(1),
                col_span: draft.span.1.max(1),
                blocks: draft.blocks,
            });
        }

        Self {
            uid,
            rows,
            cols,
            cells,
        }
    }

    /// Model-unique identity of this table.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Row and column counts as declared by the source.
    pub fn declared_size(&self) -> (usize, usize) {
        (self.rows as usize, self.cols as usize)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Logical grid size: the larger of the declared size and the extent
    /// covered by the cells and their spans.
    pub fn grid_size(&self) -> (usize, usize) {
        self.cells.iter().fold(self.declared_size(), |(rows, cols), cell| {
            (
                rows.max(cell.row as usize + cell.row_span.max(1) as usize),
                cols.max(cell.col as usize + cell.col_span.max(1) as usize),
            )
        })
    }

    /// Index of the cell covering a grid coordinate.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<usize> {
        self.cells.iter().position(|cell| cell.covers(row, col))
    }

    /// Cell indices in reading order: by row, then column, then storage order.
    pub fn cell_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.cells.len()).collect();
        order.sort_by_key(|&index| (self.cells[index].row, self.cells[index].col, index));
        order
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        }
    }
}

/// Visit every run in `blocks`, descending into table cells.
pub(crate) fn for_each_run<'a>(blocks: &'a [Block], f: &mut impl FnMut(&'a Run)) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => p.runs.iter().for_each(&mut *f),
            Block::Table(t) => {
                for cell in &t.cells {
                    for_each_run(&cell.blocks, f);
                }
            }
        }
    }
}

/// Visit every paragraph in `blocks` mutably, in document order.
///
/// Table cells are visited in [`Table::cell_order`], the order extraction
/// reads them in.
///
/// The flag tells whether the paragraph sits inside a table cell.
pub(crate) fn for_each_paragraph_mut(
    blocks: &mut [Block],
    in_table: bool,
    f: &mut impl FnMut(&mut Paragraph, bool),
) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => f(p, in_table),
            Block::Table(t) => {
                for index in t.cell_order() {
                    for_each_paragraph_mut(&mut t.cells[index].blocks, true, f);
                }
            }
        }
    }
}
