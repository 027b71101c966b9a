//! Builds a [`StructureModel`] from decoded section records.
//!
//! Ownership follows record levels: a paragraph's `PARA_TEXT` and
//! `CTRL_HEADER` records sit one level below its `PARA_HEADER`, and a
//! control's table, cells and note bodies sit below the control. Cell and
//! note paragraphs share the level of their `LIST_HEADER`.

use super::Section;
use super::consts::*;
use super::record::Record;
use super::text::{Segment, decode_para_text, field_command};
use crate::common::binary::{read_u16_le, read_u32_le};
use crate::common::field::command_target;
use crate::model::{
    Anchor, Block, CellDraft, MemoBody, NoteBody, NoteType, Paragraph, Run, StructureModel, Table,
    TextOrigin,
};
use std::collections::VecDeque;

/// Byte offset of the cell address inside a cell's `LIST_HEADER`.
const CELL_ADDRESS_OFFSET: usize = 8;

#[derive(Debug, Default)]
struct Counters {
    footnotes: u32,
    endnotes: u32,
    memos: u32,
}

pub(super) fn build_model(sections: &[Section]) -> StructureModel {
    let mut model = StructureModel::new();
    let mut counters = Counters::default();

    for (index, section) in sections.iter().enumerate() {
        let records = section.records.as_slice();
        let mut reader = SectionReader {
            section: index as u32,
            records,
            model: &mut model,
            counters: &mut counters,
            memos: VecDeque::new(),
            fields: Vec::new(),
        };
        reader.collect_memos();

        let level = records
            .iter()
            .find(|r| r.tag == HWPTAG_PARA_HEADER)
            .map_or(0, |r| r.level);
        let blocks = reader.blocks(0, records.len(), level);

        if !reader.memos.is_empty() {
            log::debug!(
                "section {index}: {} memo bodies without an anchor",
                reader.memos.len()
            );
        }
        model.blocks.extend(blocks);
    }

    model
}

struct SectionReader<'a> {
    section: u32,
    records: &'a [Record],
    model: &'a mut StructureModel,
    counters: &'a mut Counters,
    /// Memo bodies of this section, consumed by memo fields in order
    memos: VecDeque<MemoBody>,
    /// Open fields, innermost last; hyperlink fields hold their link index
    fields: Vec<Option<usize>>,
}

impl SectionReader<'_> {
    /// Index just past the subtree rooted at record `at`.
    fn subtree_end(&self, at: usize, end: usize) -> usize {
        let level = self.records[at].level;
        let mut next = at + 1;
        while next < end && self.records[next].level > level {
            next += 1;
        }
        next
    }

    fn collect_memos(&mut self) {
        let records = self.records;
        let mut at = 0;
        while at < records.len() {
            let end = self.subtree_end(at, records.len());
            if records[at].tag == HWPTAG_MEMO_LIST {
                let level = records[at].level + 1;
                let start = self.skip_list_header(at + 1, end, level);
                let blocks = self.blocks(start, end, level);
                self.counters.memos += 1;
                self.memos.push_back(MemoBody {
                    id: self.counters.memos.to_string(),
                    author: None,
                    blocks,
                });
            }
            at = end;
        }
    }

    fn skip_list_header(&self, at: usize, end: usize, level: u16) -> usize {
        match self.records.get(at) {
            Some(r) if at < end && r.tag == HWPTAG_LIST_HEADER && r.level == level => at + 1,
            _ => at,
        }
    }

    fn blocks(&mut self, start: usize, end: usize, level: u16) -> Vec<Block> {
        let records = self.records;
        let mut blocks = Vec::new();
        let mut at = start;
        while at < end {
            let next = self.subtree_end(at, end);
            let record = &records[at];
            if record.tag == HWPTAG_PARA_HEADER && record.level == level {
                let (paragraph, tables) = self.paragraph(at, next);
                blocks.push(Block::Paragraph(paragraph));
                blocks.extend(tables.into_iter().map(Block::Table));
            } else {
                log::trace!("skipping record tag {} at level {}", record.tag, record.level);
            }
            at = next;
        }
        blocks
    }

    fn current_link(&self) -> Option<usize> {
        self.fields.iter().rev().find_map(|field| *field)
    }

    fn paragraph(&mut self, at: usize, end: usize) -> (Paragraph, Vec<Table>) {
        let records = self.records;
        let child_level = records[at].level + 1;
        let mut text_record = None;
        let mut controls = Vec::new();

        let mut child = at + 1;
        while child < end {
            let next = self.subtree_end(child, end);
            let record = &records[child];
            if record.level == child_level {
                match record.tag {
                    HWPTAG_PARA_TEXT => text_record = Some(child),
                    HWPTAG_CTRL_HEADER => controls.push((child, next)),
                    _ => {}
                }
            }
            child = next;
        }

        let mut paragraph = Paragraph::default();
        let mut tables = Vec::new();
        let Some(text_at) = text_record else {
            return (paragraph, tables);
        };

        for segment in decode_para_text(&records[text_at].data) {
            match segment {
                Segment::Text { start, len, text } => {
                    let origin = TextOrigin::Hwp5 {
                        section: self.section,
                        record: text_at as u32,
                        start,
                        len,
                    };
                    paragraph.push(Run::editable(text, origin).with_link(self.current_link()));
                }
                Segment::Fixed(text) => {
                    paragraph.push(Run::fixed(text).with_link(self.current_link()));
                }
                Segment::FieldEnd => {
                    if self.fields.pop().is_none() {
                        log::debug!("field end without an open field");
                    }
                }
                Segment::Control { code, ordinal } => match controls.get(ordinal) {
                    Some(&(ctrl_at, ctrl_end)) => {
                        self.control(ctrl_at, ctrl_end, &mut paragraph, &mut tables);
                    }
                    None => log::debug!("control {code} #{ordinal} has no CTRL_HEADER"),
                },
            }
        }

        (paragraph, tables)
    }

    fn control(&mut self, at: usize, end: usize, paragraph: &mut Paragraph, tables: &mut Vec<Table>) {
        let records = self.records;
        let data = &records[at].data;
        let id = read_u32_le(data, 0).unwrap_or(0);

        match id {
            CTRL_TABLE => tables.push(self.table(at, end)),
            CTRL_FOOTNOTE => {
                let index = self.note(NoteType::Footnote, at, end);
                paragraph.push(Run::marker(Anchor::Note(index)));
            }
            CTRL_ENDNOTE => {
                let index = self.note(NoteType::Endnote, at, end);
                paragraph.push(Run::marker(Anchor::Note(index)));
            }
            CTRL_FIELD_HYPERLINK => {
                let target = field_command(data)
                    .map(|command| command_target(&command))
                    .unwrap_or_default();
                let index = self.model.push_link(target);
                paragraph.push(Run::marker(Anchor::Hyperlink(index)));
                self.fields.push(Some(index));
            }
            CTRL_FIELD_MEMO => {
                self.fields.push(None);
                match self.memos.pop_front() {
                    Some(body) => {
                        let index = self.model.push_memo(body);
                        paragraph.push(Run::marker(Anchor::Memo(index)));
                    }
                    None => log::debug!("memo field without a memo body, dropped"),
                }
            }
            id if is_field(id) => self.fields.push(None),
            id => log::trace!("ignoring control {:?}", id.to_be_bytes()),
        }
    }

    fn table(&mut self, at: usize, end: usize) -> Table {
        let records = self.records;
        let level = records[at].level + 1;
        let (mut rows, mut cols) = (0u16, 0u16);
        let mut drafts = Vec::new();

        let mut child = at + 1;
        while child < end {
            let record = &records[child];
            if record.level != level {
                child += 1;
                continue;
            }
            match record.tag {
                HWPTAG_TABLE => {
                    rows = read_u16_le(&record.data, 4).unwrap_or(0);
                    cols = read_u16_le(&record.data, 6).unwrap_or(0);
                    child += 1;
                }
                HWPTAG_LIST_HEADER => {
                    let cell_end = (child + 1..end)
                        .find(|&i| {
                            records[i].level == level && records[i].tag == HWPTAG_LIST_HEADER
                        })
                        .unwrap_or(end);
                    let (addr, span) = cell_address(&record.data);
                    let blocks = self.blocks(child + 1, cell_end, level);
                    drafts.push(CellDraft { addr, span, blocks });
                    child = cell_end;
                }
                _ => child += 1,
            }
        }

        let uid = self.model.next_table_uid();
        Table::from_drafts(uid, rows, cols, drafts)
    }

    fn note(&mut self, kind: NoteType, at: usize, end: usize) -> usize {
        let records = self.records;
        let level = records[at].level + 1;
        let start = self.skip_list_header(at + 1, end, level);
        let blocks = self.blocks(start, end, level);

        let counter = match kind {
            NoteType::Footnote => &mut self.counters.footnotes,
            NoteType::Endnote => &mut self.counters.endnotes,
        };
        *counter += 1;
        let id = *counter;

        self.model.push_note(NoteBody { kind, id, blocks })
    }
}

/// Cell address `(row, col)` and span `(rows, cols)` from a cell `LIST_HEADER`.
fn cell_address(data: &[u8]) -> (Option<(u16, u16)>, (u16, u16)) {
    let field = |index: usize| read_u16_le(data, CELL_ADDRESS_OFFSET + index * 2).ok();
    match (field(0), field(1), field(2), field(3)) {
        (Some(col), Some(row), Some(col_span), Some(row_span)) => {
            (Some((row, col)), (row_span.max(1), col_span.max(1)))
        }
        _ => (None, (1, 1)),
    }
}
