//! Format-neutral document content for tests.
//!
//! Each format module turns the same [`Item`] lists into a real container,
//! so one scenario can be checked against both readers.

use crate::model::{
    Anchor, Block, CellDraft, MemoBody, NoteBody, NoteType, Paragraph, Run, StructureModel, Table,
    TextOrigin,
};

#[derive(Debug, Clone)]
pub(crate) enum Item {
    Text(String),
    Tab,
    LineBreak,
    Footnote(String),
    Endnote(String),
    /// Hyperlink field: target, display text
    Link(String, String),
    /// Memo field: anchored text, memo body
    Memo(String, String),
    Table(FixtureTable),
}

#[derive(Debug, Clone)]
pub(crate) struct FixtureTable {
    pub(crate) rows: u16,
    pub(crate) cols: u16,
    pub(crate) cells: Vec<FixtureCell>,
}

#[derive(Debug, Clone)]
pub(crate) struct FixtureCell {
    pub(crate) row: u16,
    pub(crate) col: u16,
    pub(crate) row_span: u16,
    pub(crate) col_span: u16,
    pub(crate) paragraphs: Vec<Vec<Item>>,
}

pub(crate) fn text(s: &str) -> Item {
    Item::Text(s.to_string())
}

pub(crate) fn cell(row: u16, col: u16, content: &str) -> FixtureCell {
    FixtureCell {
        row,
        col,
        row_span: 1,
        col_span: 1,
        paragraphs: vec![vec![text(content)]],
    }
}

/// A plain table whose cell `(r, c)` reads `"r{r}c{c}"`.
pub(crate) fn grid(rows: u16, cols: u16) -> FixtureTable {
    let cells = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| cell(r, c, &format!("r{r}c{c}"))))
        .collect();
    FixtureTable { rows, cols, cells }
}

/// Build a model directly, bypassing any container format.
///
/// Editable runs get synthetic, non-overlapping HWPX spans.
pub(crate) fn model(paragraphs: &[Vec<Item>]) -> StructureModel {
    let mut builder = ModelBuilder::default();
    let blocks = builder.blocks(paragraphs);
    builder.model.blocks = blocks;
    builder.model
}

#[derive(Default)]
struct ModelBuilder {
    model: StructureModel,
    offset: usize,
    footnotes: u32,
    endnotes: u32,
    memos: u32,
}

impl ModelBuilder {
    fn blocks(&mut self, paragraphs: &[Vec<Item>]) -> Vec<Block> {
        let mut blocks = Vec::new();
        for items in paragraphs {
            let (paragraph, tables) = self.paragraph(items);
            blocks.push(Block::Paragraph(paragraph));
            blocks.extend(tables.into_iter().map(Block::Table));
        }
        blocks
    }

    fn editable(&mut self, text: &str) -> Run {
        let start = self.offset;
        self.offset += text.len() + 1;
        let origin = TextOrigin::Hwpx {
            part: 0,
            start,
            end: start + text.len(),
        };
        Run::editable(text.to_string(), origin)
    }

    fn paragraph(&mut self, items: &[Item]) -> (Paragraph, Vec<Table>) {
        let mut paragraph = Paragraph::default();
        let mut tables = Vec::new();
        for item in items {
            match item {
                Item::Text(s) => paragraph.push(self.editable(s)),
                Item::Tab => paragraph.push(Run::fixed("\t")),
                Item::LineBreak => paragraph.push(Run::fixed("\n")),
                Item::Footnote(body) | Item::Endnote(body) => {
                    let (kind, counter) = match item {
                        Item::Footnote(_) => (NoteType::Footnote, &mut self.footnotes),
                        _ => (NoteType::Endnote, &mut self.endnotes),
                    };
                    *counter += 1;
                    let id = *counter;
                    let blocks = self.blocks(&[vec![text(body)]]);
                    let index = self.model.push_note(NoteBody { kind, id, blocks });
                    paragraph.push(Run::marker(Anchor::Note(index)));
                }
                Item::Link(target, display) => {
                    let index = self.model.push_link(target.clone());
                    paragraph.push(Run::marker(Anchor::Hyperlink(index)));
                    let run = self.editable(display).with_link(Some(index));
                    paragraph.push(run);
                }
                Item::Memo(anchor, body) => {
                    self.memos += 1;
                    let blocks = self.blocks(&[vec![text(body)]]);
                    let index = self.model.push_memo(MemoBody {
                        id: self.memos.to_string(),
                        author: None,
                        blocks,
                    });
                    paragraph.push(Run::marker(Anchor::Memo(index)));
                    paragraph.push(self.editable(anchor));
                }
                Item::Table(table) => tables.push(self.table(table)),
            }
        }
        (paragraph, tables)
    }

    fn table(&mut self, table: &FixtureTable) -> Table {
        let drafts = table
            .cells
            .iter()
            .map(|cell| CellDraft {
                addr: Some((cell.row, cell.col)),
                span: (cell.row_span, cell.col_span),
                blocks: self.blocks(&cell.paragraphs),
            })
            .collect();
        let uid = self.model.next_table_uid();
        Table::from_drafts(uid, table.rows, table.cols, drafts)
    }
}
