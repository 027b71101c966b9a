//! Folds HWPX section parts into a [`StructureModel`].
//!
//! Each section part is read as one event stream. Open elements that matter
//! to the model live on a frame stack; block containers (the section root,
//! table cells, note bodies, memo bodies) collect the paragraphs that close
//! inside them, and paragraphs collect the runs and tables that close inside
//! them.
//!
//! `<hp:t>` character data becomes editable runs that remember their raw
//! byte span in the part, so the writer can splice new text in place.

use super::SectionPart;
use super::package::{NoteNumbering, attr};
use crate::common::field::command_target;
use crate::common::{Error, Result};
use crate::model::{
    Anchor, Block, CellDraft, MemoBody, NoteBody, NoteType, Paragraph, Run, StructureModel, Table,
    TextOrigin, for_each_paragraph_mut,
};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeSet, HashMap};
use std::mem;

pub(super) fn build_model(parts: &[SectionPart], numbering: NoteNumbering) -> Result<StructureModel> {
    let mut model = StructureModel::new();
    let mut ids = Ids::new(numbering);

    for (index, part) in parts.iter().enumerate() {
        let parser = SectionParser {
            part: index as u32,
            xml: &part.xml,
            model: &mut model,
            ids: &mut ids,
            stack: Vec::new(),
            fields: Vec::new(),
            pending: Vec::new(),
            memo_group: HashMap::new(),
        };
        let blocks = parser.parse().map_err(|err| match err {
            Error::CorruptDocument(msg) => Error::CorruptDocument(format!("{}: {msg}", part.name)),
            other => other,
        })?;
        log::debug!("{}: {} blocks", part.name, blocks.len());
        model.blocks.extend(blocks);
    }

    Ok(model)
}

/// Note and memo identifiers handed out across all sections.
#[derive(Debug)]
struct Ids {
    footnotes: BTreeSet<u32>,
    endnotes: BTreeSet<u32>,
    next_footnote: u32,
    next_endnote: u32,
    memos: u32,
}

impl Ids {
    fn new(numbering: NoteNumbering) -> Self {
        Self {
            footnotes: BTreeSet::new(),
            endnotes: BTreeSet::new(),
            next_footnote: numbering.footnote,
            next_endnote: numbering.endnote,
            memos: 0,
        }
    }

    /// Keep the declared id when it is still free, else take the next free one.
    fn note(&mut self, kind: NoteType, declared: Option<u32>) -> u32 {
        let (used, next) = match kind {
            NoteType::Footnote => (&mut self.footnotes, &mut self.next_footnote),
            NoteType::Endnote => (&mut self.endnotes, &mut self.next_endnote),
        };
        let id = match declared {
            Some(id) if !used.contains(&id) => id,
            _ => {
                while used.contains(next) {
                    *next += 1;
                }
                *next
            }
        };
        used.insert(id);
        id
    }

    fn memo(&mut self) -> String {
        self.memos += 1;
        self.memos.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Hyperlink,
    Memo,
    Other,
}

impl FieldKind {
    fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("HYPERLINK") => FieldKind::Hyperlink,
            Some(v) if v.eq_ignore_ascii_case("MEMO") => FieldKind::Memo,
            _ => FieldKind::Other,
        }
    }
}

/// A field between its `fieldBegin` and `fieldEnd`.
#[derive(Debug)]
struct OpenField {
    id: Option<String>,
    link: Option<usize>,
}

/// Memo anchor waiting for the end of its section.
#[derive(Debug)]
enum PendingMemo {
    Inline(MemoBody),
    Reference(String),
}

#[derive(Debug)]
enum Frame {
    Section {
        blocks: Vec<Block>,
    },
    Paragraph {
        paragraph: Paragraph,
        tables: Vec<Table>,
    },
    Text {
        chunk: Option<(usize, usize)>,
    },
    Table {
        rows: u16,
        cols: u16,
        drafts: Vec<CellDraft>,
    },
    Cell(CellDraft),
    Note {
        kind: NoteType,
        declared: Option<u32>,
        blocks: Vec<Block>,
    },
    Field {
        kind: FieldKind,
        id: Option<String>,
        params: Vec<(String, String)>,
        blocks: Vec<Block>,
    },
    Memo {
        id: Option<String>,
        author: Option<String>,
        blocks: Vec<Block>,
    },
    Param {
        name: String,
        chunk: Option<(usize, usize)>,
    },
    Other,
}

impl Frame {
    fn is_container(&self) -> bool {
        matches!(
            self,
            Frame::Section { .. }
                | Frame::Note { .. }
                | Frame::Field { .. }
                | Frame::Memo { .. }
                | Frame::Cell(_)
        )
    }

    fn blocks_mut(&mut self) -> Option<&mut Vec<Block>> {
        match self {
            Frame::Section { blocks }
            | Frame::Note { blocks, .. }
            | Frame::Field { blocks, .. }
            | Frame::Memo { blocks, .. } => Some(blocks),
            Frame::Cell(draft) => Some(&mut draft.blocks),
            _ => None,
        }
    }
}

struct SectionParser<'a> {
    part: u32,
    xml: &'a str,
    model: &'a mut StructureModel,
    ids: &'a mut Ids,
    stack: Vec<Frame>,
    /// Open fields, innermost last
    fields: Vec<OpenField>,
    /// Memo anchors of this section; `Anchor::Memo` holds an index here until resolved
    pending: Vec<PendingMemo>,
    /// `<hp:memogroup>` bodies by memo id
    memo_group: HashMap<String, MemoBody>,
}

impl SectionParser<'_> {
    fn parse(mut self) -> Result<Vec<Block>> {
        let notes_from = self.model.notes.len();
        let mut reader = Reader::from_str(self.xml);
        self.stack.push(Frame::Section { blocks: Vec::new() });

        loop {
            let before = reader.buffer_position() as usize;
            let event = reader.read_event()?;
            let after = reader.buffer_position() as usize;
            match event {
                Event::Start(e) => {
                    self.flush_text()?;
                    let frame = self.open(&e);
                    self.stack.push(frame);
                }
                Event::Empty(e) => {
                    self.flush_text()?;
                    let frame = self.open(&e);
                    self.stack.push(frame);
                    self.close()?;
                }
                Event::End(_) => {
                    self.flush_text()?;
                    self.close()?;
                }
                Event::Text(_) | Event::GeneralRef(_) => self.extend_chunk(before, after),
                Event::CData(e) => {
                    self.flush_text()?;
                    if matches!(self.stack.last(), Some(Frame::Text { .. })) {
                        self.push_fixed(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let mut blocks = match (self.stack.pop(), self.stack.is_empty()) {
            (Some(Frame::Section { blocks }), true) => blocks,
            _ => {
                return Err(Error::CorruptDocument(
                    "section part ends inside an open element".to_string(),
                ));
            }
        };

        if !self.fields.is_empty() {
            log::debug!("{} fields left open at section end", self.fields.len());
        }
        self.resolve_memos(&mut blocks, notes_from);
        Ok(blocks)
    }

    fn open(&mut self, e: &BytesStart<'_>) -> Frame {
        match e.local_name().as_ref() {
            b"p" => Frame::Paragraph {
                paragraph: Paragraph::default(),
                tables: Vec::new(),
            },
            b"t" => Frame::Text { chunk: None },
            b"tab" => {
                self.push_fixed("\t");
                Frame::Other
            }
            b"lineBreak" => {
                self.push_fixed("\n");
                Frame::Other
            }
            b"tbl" => Frame::Table {
                rows: number(e, b"rowCnt").unwrap_or(0),
                cols: number(e, b"colCnt").unwrap_or(0),
                drafts: Vec::new(),
            },
            b"tc" => Frame::Cell(CellDraft {
                addr: None,
                span: (1, 1),
                blocks: Vec::new(),
            }),
            b"cellAddr" => {
                if let (Some(Frame::Cell(draft)), Some(col), Some(row)) = (
                    self.stack.last_mut(),
                    number(e, b"colAddr"),
                    number(e, b"rowAddr"),
                ) {
                    draft.addr = Some((row, col));
                }
                Frame::Other
            }
            b"cellSpan" => {
                if let Some(Frame::Cell(draft)) = self.stack.last_mut() {
                    let rows = number(e, b"rowSpan").unwrap_or(1u16);
                    let cols = number(e, b"colSpan").unwrap_or(1u16);
                    draft.span = (rows.max(1), cols.max(1));
                }
                Frame::Other
            }
            b"footNote" | b"endNote" => Frame::Note {
                kind: if e.local_name().as_ref() == b"footNote" {
                    NoteType::Footnote
                } else {
                    NoteType::Endnote
                },
                declared: number(e, b"number").or_else(|| number(e, b"instId")),
                blocks: Vec::new(),
            },
            b"fieldBegin" => Frame::Field {
                kind: FieldKind::from_attr(attr(e, b"type").as_deref()),
                id: attr(e, b"id"),
                params: Vec::new(),
                blocks: Vec::new(),
            },
            b"fieldEnd" => {
                self.end_field(attr(e, b"beginIDRef"));
                Frame::Other
            }
            b"stringParam" | b"integerParam" | b"booleanParam" | b"floatParam"
                if self.in_field() =>
            {
                Frame::Param {
                    name: attr(e, b"name").unwrap_or_default(),
                    chunk: None,
                }
            }
            b"memo" => Frame::Memo {
                id: attr(e, b"id"),
                author: attr(e, b"author"),
                blocks: Vec::new(),
            },
            _ => Frame::Other,
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.stack.len() < 2 {
            return Err(Error::CorruptDocument("unbalanced section part".to_string()));
        }
        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };

        match frame {
            Frame::Paragraph { paragraph, tables } => {
                if let Some(blocks) = self.container() {
                    blocks.push(Block::Paragraph(paragraph));
                    blocks.extend(tables.into_iter().map(Block::Table));
                }
            }
            Frame::Table { rows, cols, drafts } => {
                let uid = self.model.next_table_uid();
                let table = Table::from_drafts(uid, rows, cols, drafts);
                self.attach_table(table);
            }
            Frame::Cell(draft) => match self.table() {
                Some(Frame::Table { drafts, .. }) => drafts.push(draft),
                _ => log::debug!("table cell outside a table, dropped"),
            },
            Frame::Note {
                kind,
                declared,
                blocks,
            } => {
                let id = self.ids.note(kind, declared);
                let index = self.model.push_note(NoteBody { kind, id, blocks });
                self.push_run(Run::marker(Anchor::Note(index)));
            }
            Frame::Field {
                kind,
                id,
                params,
                blocks,
            } => self.begin_field(kind, id, params, blocks),
            Frame::Memo { id, author, blocks } => match id {
                Some(id) => {
                    let body = MemoBody {
                        id: id.clone(),
                        author,
                        blocks,
                    };
                    self.memo_group.insert(id, body);
                }
                None => log::debug!("memo without an id, dropped"),
            },
            Frame::Param { name, chunk } => {
                let value = match chunk {
                    Some((start, end)) => self.unescaped(start, end)?,
                    None => String::new(),
                };
                if let Some(Frame::Field { params, .. }) = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|frame| matches!(frame, Frame::Field { .. }))
                {
                    params.push((name, value));
                }
            }
            Frame::Text { .. } | Frame::Section { .. } | Frame::Other => {}
        }
        Ok(())
    }

    fn in_field(&self) -> bool {
        self.stack
            .iter()
            .rev()
            .take_while(|frame| !matches!(frame, Frame::Paragraph { .. }))
            .any(|frame| matches!(frame, Frame::Field { .. }))
    }

    /// Innermost block container.
    fn container(&mut self) -> Option<&mut Vec<Block>> {
        self.stack.iter_mut().rev().find_map(Frame::blocks_mut)
    }

    /// Innermost paragraph that is not outside the innermost container.
    fn paragraph(&mut self) -> Option<&mut Frame> {
        self.stack
            .iter_mut()
            .rev()
            .find(|frame| matches!(frame, Frame::Paragraph { .. }) || frame.is_container())
            .filter(|frame| matches!(frame, Frame::Paragraph { .. }))
    }

    /// Innermost table, looking through row wrappers but not past a container.
    fn table(&mut self) -> Option<&mut Frame> {
        self.stack
            .iter_mut()
            .rev()
            .find(|frame| matches!(frame, Frame::Table { .. }) || frame.is_container())
            .filter(|frame| matches!(frame, Frame::Table { .. }))
    }

    fn push_run(&mut self, run: Run) {
        match self.paragraph() {
            Some(Frame::Paragraph { paragraph, .. }) => paragraph.push(run),
            _ => log::trace!("run outside a paragraph, dropped"),
        }
    }

    fn push_fixed(&mut self, text: &str) {
        let link = self.current_link();
        self.push_run(Run::fixed(text).with_link(link));
    }

    fn attach_table(&mut self, table: Table) {
        if let Some(Frame::Paragraph { tables, .. }) = self.paragraph() {
            tables.push(table);
        } else if let Some(blocks) = self.container() {
            blocks.push(Block::Table(table));
        }
    }

    fn current_link(&self) -> Option<usize> {
        self.fields.iter().rev().find_map(|field| field.link)
    }

    fn extend_chunk(&mut self, start: usize, end: usize) {
        if let Some(Frame::Text { chunk } | Frame::Param { chunk, .. }) = self.stack.last_mut() {
            *chunk = Some(match *chunk {
                Some((first, _)) => (first, end),
                None => (start, end),
            });
        }
    }

    /// Turn buffered character data of the open `<hp:t>` into an editable run.
    fn flush_text(&mut self) -> Result<()> {
        let Some(Frame::Text { chunk }) = self.stack.last_mut() else {
            return Ok(());
        };
        let Some((start, end)) = chunk.take() else {
            return Ok(());
        };

        let text = self.unescaped(start, end)?;
        let origin = TextOrigin::Hwpx {
            part: self.part,
            start,
            end,
        };
        let run = Run::editable(text, origin).with_link(self.current_link());
        self.push_run(run);
        Ok(())
    }

    fn unescaped(&self, start: usize, end: usize) -> Result<String> {
        let raw = self.xml.get(start..end).ok_or_else(|| {
            Error::CorruptDocument(format!("character data {start}..{end} out of bounds"))
        })?;
        unescape(raw)
            .map(|text| text.into_owned())
            .map_err(|e| Error::CorruptDocument(format!("character data at byte {start}: {e}")))
    }

    fn begin_field(
        &mut self,
        kind: FieldKind,
        id: Option<String>,
        params: Vec<(String, String)>,
        blocks: Vec<Block>,
    ) {
        let param = |name: &str| {
            params
                .iter()
                .find(|(key, value)| key.eq_ignore_ascii_case(name) && !value.is_empty())
                .map(|(_, value)| value.clone())
        };

        match kind {
            FieldKind::Hyperlink => {
                let target = param("Path")
                    .or_else(|| param("Command").map(|command| command_target(&command)))
                    .unwrap_or_default();
                let index = self.model.push_link(target);
                self.push_run(Run::marker(Anchor::Hyperlink(index)));
                self.fields.push(OpenField {
                    id,
                    link: Some(index),
                });
            }
            FieldKind::Memo => {
                let key = param("MemoId").or_else(|| id.clone());
                let pending = if !blocks.is_empty() {
                    let id = key.unwrap_or_else(|| self.ids.memo());
                    Some(PendingMemo::Inline(MemoBody {
                        id,
                        author: param("Author"),
                        blocks,
                    }))
                } else {
                    key.map(PendingMemo::Reference)
                };
                match pending {
                    Some(memo) => {
                        let slot = self.pending.len();
                        self.pending.push(memo);
                        self.push_run(Run::marker(Anchor::Memo(slot)));
                    }
                    None => log::debug!("memo field without a body or id, dropped"),
                }
                self.fields.push(OpenField { id, link: None });
            }
            FieldKind::Other => self.fields.push(OpenField { id, link: None }),
        }
    }

    fn end_field(&mut self, begin: Option<String>) {
        let at = match begin {
            Some(begin) => self
                .fields
                .iter()
                .rposition(|field| field.id.as_deref() == Some(begin.as_str())),
            None => self.fields.len().checked_sub(1),
        };
        match at {
            Some(at) => {
                self.fields.remove(at);
            }
            None => log::debug!("field end without a matching begin"),
        }
    }

    /// Replace pending memo anchors with model memo indices, dropping the
    /// ones whose body never showed up.
    fn resolve_memos(&mut self, blocks: &mut [Block], notes_from: usize) {
        if self.pending.is_empty() {
            if !self.memo_group.is_empty() {
                log::debug!("{} memos without an anchor", self.memo_group.len());
            }
            return;
        }

        let mut pending: Vec<Option<PendingMemo>> =
            mem::take(&mut self.pending).into_iter().map(Some).collect();
        let group = mem::take(&mut self.memo_group);
        let model = &mut *self.model;
        let mut notes = model.notes.split_off(notes_from);

        let mut resolve = |paragraph: &mut Paragraph, _in_table: bool| {
            for run in paragraph.runs.iter_mut() {
                run.anchors.retain(|anchor| {
                    let Anchor::Memo(slot) = anchor else {
                        return true;
                    };
                    let body = match pending.get_mut(*slot).and_then(Option::take) {
                        Some(PendingMemo::Inline(body)) => Some(body),
                        Some(PendingMemo::Reference(key)) => {
                            let body = group.get(&key).cloned();
                            if body.is_none() {
                                log::debug!("memo {key} is not in the memo group, dropped");
                            }
                            body
                        }
                        None => None,
                    };
                    match body {
                        Some(body) => {
                            *slot = model.push_memo(body);
                            true
                        }
                        None => false,
                    }
                });
            }
            paragraph
                .runs
                .retain(|run| run.origin.is_some() || !run.text.is_empty() || !run.anchors.is_empty());
        };

        for_each_paragraph_mut(blocks, false, &mut resolve);
        for note in &mut notes {
            for_each_paragraph_mut(&mut note.blocks, false, &mut resolve);
        }
        model.notes.extend(notes);
    }
}

fn number<T: std::str::FromStr>(e: &BytesStart<'_>, name: &[u8]) -> Option<T> {
    attr(e, name).and_then(|value| value.trim().parse().ok())
}
