//! In-memory HWP5 documents for tests.

use super::consts::*;
use super::deflate;
use super::header::{FileHeader, HeaderFlags};
use super::record::{Record, encode_records};
use crate::common::binary::units_to_bytes;
use crate::fixtures::{FixtureTable, Item, text};
use crate::ole::OleWriter;

fn control(code: u16) -> [u16; CONTROL_WIDTH] {
    let mut units = [0u16; CONTROL_WIDTH];
    units[0] = code;
    units[CONTROL_WIDTH - 1] = code;
    units
}

fn ctrl_header(id: u32) -> Vec<u8> {
    let mut data = id.to_le_bytes().to_vec();
    data.extend_from_slice(&[0u8; 8]);
    data
}

fn field_header(id: u32, command: &str) -> Vec<u8> {
    let command: Vec<u16> = command.encode_utf16().collect();
    let mut data = id.to_le_bytes().to_vec();
    data.extend_from_slice(&[0u8; 5]);
    data.extend_from_slice(&(command.len() as u16).to_le_bytes());
    data.extend_from_slice(&units_to_bytes(&command));
    data.extend_from_slice(&1u32.to_le_bytes());
    data
}

#[derive(Debug, Default)]
pub(crate) struct SectionBuilder {
    records: Vec<Record>,
    memos: Vec<String>,
}

impl SectionBuilder {
    pub(crate) fn paragraph(&mut self, items: Vec<Item>) -> &mut Self {
        let mut records = std::mem::take(&mut self.records);
        self.push_paragraph(&mut records, 0, &items);
        self.records = records;
        self
    }

    fn push_paragraph(&mut self, out: &mut Vec<Record>, level: u16, items: &[Item]) {
        let mut units: Vec<u16> = Vec::new();
        let mut controls: Vec<Vec<Record>> = Vec::new();
        let child = level + 1;

        for item in items {
            match item {
                Item::Text(s) => units.extend(s.encode_utf16()),
                Item::Tab => units.extend(control(CH_TAB)),
                Item::LineBreak => units.push(CH_LINE_BREAK),
                Item::Footnote(body) | Item::Endnote(body) => {
                    units.extend(control(CH_NOTE));
                    let id = match item {
                        Item::Footnote(_) => CTRL_FOOTNOTE,
                        _ => CTRL_ENDNOTE,
                    };
                    let mut subtree = vec![
                        Record::new(HWPTAG_CTRL_HEADER, child, ctrl_header(id)),
                        Record::new(HWPTAG_LIST_HEADER, child + 1, vec![0u8; 8]),
                    ];
                    self.push_paragraph(&mut subtree, child + 1, &[text(body)]);
                    controls.push(subtree);
                }
                Item::Link(target, display) => {
                    units.extend(control(CH_FIELD_START));
                    let command = format!("{};1;0;0;", target.replace(':', "\\:"));
                    controls.push(vec![Record::new(
                        HWPTAG_CTRL_HEADER,
                        child,
                        field_header(CTRL_FIELD_HYPERLINK, &command),
                    )]);
                    units.extend(display.encode_utf16());
                    units.extend(control(CH_FIELD_END));
                }
                Item::Memo(anchor_text, body) => {
                    units.extend(control(CH_FIELD_START));
                    controls.push(vec![Record::new(
                        HWPTAG_CTRL_HEADER,
                        child,
                        field_header(CTRL_FIELD_MEMO, ""),
                    )]);
                    units.extend(anchor_text.encode_utf16());
                    units.extend(control(CH_FIELD_END));
                    self.memos.push(body.clone());
                }
                Item::Table(table) => {
                    units.extend(control(CH_TABLE_OR_DRAWING));
                    controls.push(self.table_records(child, table));
                }
            }
        }
        units.push(CH_PARA_END);

        let mut header = vec![0u8; 22];
        header[0..4].copy_from_slice(&(units.len() as u32 | 0x8000_0000).to_le_bytes());
        header[12..14].copy_from_slice(&2u16.to_le_bytes());
        out.push(Record::new(HWPTAG_PARA_HEADER, level, header));
        out.push(Record::new(HWPTAG_PARA_TEXT, child, units_to_bytes(&units)));

        let last = units.len() as u32 - 1;
        let mut shapes = Vec::new();
        for (pos, id) in [(0u32, 0u32), (last, 1)] {
            shapes.extend_from_slice(&pos.to_le_bytes());
            shapes.extend_from_slice(&id.to_le_bytes());
        }
        out.push(Record::new(HWPTAG_PARA_CHAR_SHAPE, child, shapes));

        let mut line_seg = vec![0u8; 36];
        line_seg[0..4].copy_from_slice(&0u32.to_le_bytes());
        out.push(Record::new(HWPTAG_PARA_LINE_SEG, child, line_seg));

        for subtree in controls {
            out.extend(subtree);
        }
    }

    fn table_records(&mut self, level: u16, table: &FixtureTable) -> Vec<Record> {
        let inner = level + 1;
        let mut table_data = vec![0u8; 8];
        table_data[4..6].copy_from_slice(&table.rows.to_le_bytes());
        table_data[6..8].copy_from_slice(&table.cols.to_le_bytes());

        let mut out = vec![
            Record::new(HWPTAG_CTRL_HEADER, level, ctrl_header(CTRL_TABLE)),
            Record::new(HWPTAG_TABLE, inner, table_data),
        ];
        for cell in &table.cells {
            let mut list = vec![0u8; 8];
            for value in [cell.col, cell.row, cell.col_span, cell.row_span] {
                list.extend_from_slice(&value.to_le_bytes());
            }
            list.extend_from_slice(&[0u8; 8]);
            out.push(Record::new(HWPTAG_LIST_HEADER, inner, list));
            for paragraph in &cell.paragraphs {
                self.push_paragraph(&mut out, inner, paragraph);
            }
        }
        out
    }

    /// Section records, with the memo list appended after the body.
    pub(crate) fn records(&mut self) -> Vec<Record> {
        let mut out = self.records.clone();
        for body in std::mem::take(&mut self.memos) {
            out.push(Record::new(HWPTAG_MEMO_LIST, 0, vec![0u8; 4]));
            out.push(Record::new(HWPTAG_LIST_HEADER, 1, vec![0u8; 8]));
            self.push_paragraph(&mut out, 1, &[text(&body)]);
        }
        out
    }
}

/// Build a complete HWP5 file from sections of paragraphs.
pub(crate) fn document(sections: Vec<Vec<Vec<Item>>>, compressed: bool) -> Vec<u8> {
    let flags = if compressed {
        HeaderFlags::COMPRESSED
    } else {
        HeaderFlags::empty()
    };
    let header = FileHeader {
        version: 0x0500_0300,
        flags,
    };

    let mut writer = OleWriter::new();
    writer.create_stream(&["FileHeader"], &header.to_bytes()).unwrap();
    writer.create_stream(&["DocInfo"], &[0u8; 16]).unwrap();
    for (index, paragraphs) in sections.into_iter().enumerate() {
        let mut builder = SectionBuilder::default();
        for items in paragraphs {
            builder.paragraph(items);
        }
        let mut data = encode_records(&builder.records());
        if compressed {
            data = deflate(&data).unwrap();
        }
        let name = format!("Section{index}");
        writer.create_stream(&["BodyText", &name], &data).unwrap();
    }
    writer.to_bytes().unwrap()
}
