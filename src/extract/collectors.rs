//! Visitors that collect text and annotations.

use super::config::ExtractOptions;
use super::types::{AnchorLocation, ExtractResult, Hyperlink, MemoData, NoteData};
use super::visitor::{Boundary, Visitor, walk};
use crate::model::{Anchor, Block, NodePath, NoteType, Run, StructureModel, Table};
use std::collections::HashMap;

/// Plain text of a block sequence under the given separator policy.
pub fn blocks_text(blocks: &[Block], options: &ExtractOptions) -> String {
    let mut collector = TextCollector::new(options);
    walk(blocks, &mut collector);
    collector.finish()
}

/// Concatenates run text, placing separators only between emitted content.
pub struct TextCollector<'o> {
    options: &'o ExtractOptions,
    out: String,
    pending: Option<&'o str>,
    started: bool,
    /// Depth of excluded tables around the current position
    skipping: usize,
}

impl<'o> TextCollector<'o> {
    pub fn new(options: &'o ExtractOptions) -> Self {
        Self {
            options,
            out: String::new(),
            pending: None,
            started: false,
            skipping: 0,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Visitor for TextCollector<'_> {
    fn paragraph_start(&mut self, _path: &NodePath) {
        if self.skipping > 0 {
            return;
        }
        if let Some(separator) = self.pending.take() {
            self.out.push_str(separator);
        }
        self.started = true;
    }

    fn run(&mut self, run: &Run, _path: &NodePath, _index: usize) {
        if self.skipping == 0 {
            self.out.push_str(run.text());
        }
    }

    fn table_start(&mut self, _table: &Table, _path: &NodePath) {
        if self.skipping > 0 || !self.options.include_tables {
            self.skipping += 1;
        }
    }

    fn table_end(&mut self, _table: &Table, _path: &NodePath) {
        self.skipping = self.skipping.saturating_sub(1);
    }

    fn boundary(&mut self, boundary: Boundary) {
        if self.skipping > 0 || !self.started {
            return;
        }
        let options = self.options;
        let separator: &str = match boundary {
            Boundary::Block => &options.paragraph_separator,
            Boundary::Cell => &options.cell_separator,
            Boundary::Row => &options.row_separator,
        };
        self.pending = Some(separator);
    }
}

/// Footnotes and endnotes in anchor order.
pub struct NoteCollector<'a> {
    model: &'a StructureModel,
    options: &'a ExtractOptions,
    notes: Vec<NoteData>,
}

impl<'a> NoteCollector<'a> {
    pub fn new(model: &'a StructureModel, options: &'a ExtractOptions) -> Self {
        Self {
            model,
            options,
            notes: Vec::new(),
        }
    }

    pub fn finish(self) -> Vec<NoteData> {
        self.notes
    }

    /// Split into `(footnotes, endnotes)`, each in anchor order.
    pub fn finish_split(self) -> (Vec<NoteData>, Vec<NoteData>) {
        self.notes
            .into_iter()
            .partition(|note| note.note_type == NoteType::Footnote)
    }
}

impl Visitor for NoteCollector<'_> {
    fn run(&mut self, run: &Run, path: &NodePath, index: usize) {
        for anchor in run.anchors() {
            let Anchor::Note(note) = *anchor else {
                continue;
            };
            match self.model.notes().get(note) {
                Some(body) => self.notes.push(NoteData {
                    note_type: body.kind,
                    id: body.id,
                    text: blocks_text(body.blocks(), self.options),
                    anchor: AnchorLocation::new(path, index),
                }),
                None => log::debug!("note anchor {note} has no body, skipped"),
            }
        }
    }
}

/// Hyperlinks in anchor order with their display text.
pub struct LinkCollector<'a> {
    model: &'a StructureModel,
    links: Vec<Hyperlink>,
    /// Model link index to position in `links`
    open: HashMap<usize, usize>,
}

impl<'a> LinkCollector<'a> {
    pub fn new(model: &'a StructureModel) -> Self {
        Self {
            model,
            links: Vec::new(),
            open: HashMap::new(),
        }
    }

    pub fn finish(self) -> Vec<Hyperlink> {
        self.links
    }
}

impl Visitor for LinkCollector<'_> {
    fn run(&mut self, run: &Run, _path: &NodePath, _index: usize) {
        for anchor in run.anchors() {
            let Anchor::Hyperlink(link) = *anchor else {
                continue;
            };
            match self.model.link_target(link) {
                Some(url) => {
                    self.open.insert(link, self.links.len());
                    self.links.push(Hyperlink {
                        text: String::new(),
                        url: url.to_string(),
                    });
                }
                None => log::debug!("hyperlink anchor {link} has no target, skipped"),
            }
        }

        if let Some(position) = run.link().and_then(|link| self.open.get(&link).copied()) {
            self.links[position].text.push_str(run.text());
        }
    }
}

/// Memos in anchor order.
pub struct MemoCollector<'a> {
    model: &'a StructureModel,
    options: &'a ExtractOptions,
    memos: Vec<MemoData>,
}

impl<'a> MemoCollector<'a> {
    pub fn new(model: &'a StructureModel, options: &'a ExtractOptions) -> Self {
        Self {
            model,
            options,
            memos: Vec::new(),
        }
    }

    pub fn finish(self) -> Vec<MemoData> {
        self.memos
    }
}

impl Visitor for MemoCollector<'_> {
    fn run(&mut self, run: &Run, path: &NodePath, index: usize) {
        for anchor in run.anchors() {
            let Anchor::Memo(memo) = *anchor else {
                continue;
            };
            match self.model.memos().get(memo) {
                Some(body) => self.memos.push(MemoData {
                    id: body.id.clone(),
                    text: blocks_text(body.blocks(), self.options),
                    author: body.author.clone(),
                    anchor: AnchorLocation::new(path, index),
                }),
                None => log::debug!("memo anchor {memo} has no body, skipped"),
            }
        }
    }
}

/// Every collector fed from one traversal.
pub struct Pipeline<'a> {
    text: TextCollector<'a>,
    notes: NoteCollector<'a>,
    links: LinkCollector<'a>,
    memos: MemoCollector<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(model: &'a StructureModel, options: &'a ExtractOptions) -> Self {
        Self {
            text: TextCollector::new(options),
            notes: NoteCollector::new(model, options),
            links: LinkCollector::new(model),
            memos: MemoCollector::new(model, options),
        }
    }

    pub fn finish(self) -> ExtractResult {
        let (footnotes, endnotes) = self.notes.finish_split();
        ExtractResult {
            text: self.text.finish(),
            footnotes,
            endnotes,
            hyperlinks: self.links.finish(),
            memos: self.memos.finish(),
        }
    }
}

impl Visitor for Pipeline<'_> {
    fn paragraph_start(&mut self, path: &NodePath) {
        self.text.paragraph_start(path);
    }

    fn run(&mut self, run: &Run, path: &NodePath, index: usize) {
        self.text.run(run, path, index);
        self.notes.run(run, path, index);
        self.links.run(run, path, index);
        self.memos.run(run, path, index);
    }

    fn table_start(&mut self, table: &Table, path: &NodePath) {
        self.text.table_start(table, path);
    }

    fn table_end(&mut self, table: &Table, path: &NodePath) {
        self.text.table_end(table, path);
    }

    fn boundary(&mut self, boundary: Boundary) {
        self.text.boundary(boundary);
    }
}
