//! Writes edited text back into an HWP5 container.

use super::consts::*;
use super::record::{Record, encode_records};
use super::text::encode_text;
use super::{Hwp5Error, Hwp5Source, deflate};
use crate::common::binary::{read_u32_le, units_to_bytes, utf16_units, write_u32_le};
use crate::model::{StructureModel, TextOrigin};
use crate::ole::{OleFile, OleWriter};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Size of one `PARA_LINE_SEG` entry.
const LINE_SEG_SIZE: usize = 36;
/// Size of one `PARA_RANGE_TAG` entry.
const RANGE_TAG_SIZE: usize = 12;
/// `PARA_HEADER` keeps a flag in the top bit of its character count.
const NCHARS_MASK: u32 = 0x7FFF_FFFF;

/// Replacement of units `start..start + len` of one `PARA_TEXT` record.
#[derive(Debug, Clone)]
struct Edit<'a> {
    start: u32,
    len: u32,
    text: &'a str,
}

/// Section index -> record index -> edits
type EditMap<'a> = BTreeMap<u32, BTreeMap<u32, Vec<Edit<'a>>>>;

/// Serialize the document, re-encoding only sections that hold edited runs.
pub fn write(source: &Hwp5Source, model: &StructureModel) -> Result<Vec<u8>, Hwp5Error> {
    let mut edits: EditMap<'_> = BTreeMap::new();
    for (origin, text) in model.edited_runs() {
        if let TextOrigin::Hwp5 {
            section,
            record,
            start,
            len,
        } = origin
        {
            edits
                .entry(section)
                .or_default()
                .entry(record)
                .or_default()
                .push(Edit { start, len, text });
        }
    }

    let mut replaced: BTreeMap<Vec<String>, Vec<u8>> = BTreeMap::new();
    for (section_index, section_edits) in edits {
        let Some(section) = source.sections.get(section_index as usize) else {
            log::warn!("edit refers to missing section {section_index}");
            continue;
        };
        let records = apply_edits(&section.records, section_edits)?;
        let mut data = encode_records(&records);
        if source.header.is_compressed() {
            data = deflate(&data)?;
        }
        replaced.insert(section.path.clone(), data);
    }

    let mut ole = OleFile::open(Cursor::new(source.bytes.as_slice()))?;
    let mut writer = OleWriter::new();
    for path in ole.list_storages() {
        let names: Vec<&str> = path.iter().map(String::as_str).collect();
        writer.create_storage(&names)?;
    }
    for path in ole.list_streams() {
        let names: Vec<&str> = path.iter().map(String::as_str).collect();
        match replaced.get(&path) {
            Some(data) => writer.create_stream(&names, data)?,
            None => writer.create_stream(&names, &ole.open_stream(&names)?)?,
        }
    }

    Ok(writer.to_bytes()?)
}

fn apply_edits(
    records: &[Record],
    edits: BTreeMap<u32, Vec<Edit<'_>>>,
) -> Result<Vec<Record>, Hwp5Error> {
    let mut records = records.to_vec();

    for (record_index, mut edits) in edits {
        let index = record_index as usize;
        let Some(record) = records.get_mut(index) else {
            return Err(Hwp5Error::Malformed(format!("edit refers to missing record {index}")));
        };
        if record.tag != HWPTAG_PARA_TEXT {
            return Err(Hwp5Error::Malformed(format!("record {index} is not PARA_TEXT")));
        }

        // Later edits first so earlier positions stay valid.
        edits.sort_by(|a, b| b.start.cmp(&a.start));
        let mut units = utf16_units(&record.data);
        let mut shifts = Vec::with_capacity(edits.len());
        for edit in &edits {
            let start = edit.start as usize;
            let end = start + edit.len as usize;
            if end > units.len() {
                return Err(Hwp5Error::Malformed(format!(
                    "edit {start}..{end} exceeds PARA_TEXT of {} units",
                    units.len()
                )));
            }
            let replacement = encode_text(edit.text);
            shifts.push(Shift {
                start: edit.start,
                old_len: edit.len,
                new_len: replacement.len() as u32,
            });
            units.splice(start..end, replacement);
        }
        record.data = units_to_bytes(&units);
        let text_level = record.level;
        let nchars = units.len() as u32;

        let Some(header_index) = records[..index]
            .iter()
            .rposition(|r| r.tag == HWPTAG_PARA_HEADER && r.level + 1 == text_level)
        else {
            return Err(Hwp5Error::Malformed(format!("PARA_TEXT {index} has no PARA_HEADER")));
        };

        let header = &mut records[header_index];
        let flags = read_u32_le(&header.data, 0)? & !NCHARS_MASK;
        write_u32_le(&mut header.data, 0, flags | (nchars & NCHARS_MASK));

        let siblings = records[header_index + 1..]
            .iter()
            .position(|r| r.level < text_level)
            .map_or(records.len(), |offset| header_index + 1 + offset);
        for sibling in &mut records[header_index + 1..siblings] {
            if sibling.level != text_level {
                continue;
            }
            match sibling.tag {
                HWPTAG_PARA_CHAR_SHAPE => shift_positions(&mut sibling.data, 8, &[0], &shifts),
                HWPTAG_PARA_LINE_SEG => {
                    shift_positions(&mut sibling.data, LINE_SEG_SIZE, &[0], &shifts)
                }
                HWPTAG_PARA_RANGE_TAG => {
                    shift_positions(&mut sibling.data, RANGE_TAG_SIZE, &[0, 4], &shifts)
                }
                _ => {}
            }
        }
    }

    Ok(records)
}

/// Length change of one replaced unit range.
#[derive(Debug, Clone, Copy)]
struct Shift {
    start: u32,
    old_len: u32,
    new_len: u32,
}

impl Shift {
    fn apply(&self, pos: u32) -> u32 {
        let old_end = self.start + self.old_len;
        if pos >= old_end {
            (pos - self.old_len) + self.new_len
        } else if pos > self.start {
            pos.min(self.start + self.new_len)
        } else {
            pos
        }
    }
}

/// Rewrite the u32 text positions at `fields` of every `entry_size` entry.
///
/// Shifts arrive in descending start order, matching how the text was edited.
fn shift_positions(data: &mut [u8], entry_size: usize, fields: &[usize], shifts: &[Shift]) {
    for entry in (0..data.len() / entry_size).map(|i| i * entry_size) {
        for &field in fields {
            let offset = entry + field;
            let Ok(mut pos) = read_u32_le(data, offset) else {
                continue;
            };
            for shift in shifts {
                pos = shift.apply(pos);
            }
            write_u32_le(data, offset, pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_moves_positions_after_the_edit() {
        let shift = Shift {
            start: 4,
            old_len: 3,
            new_len: 5,
        };
        assert_eq!(shift.apply(2), 2);
        assert_eq!(shift.apply(4), 4);
        assert_eq!(shift.apply(6), 6);
        assert_eq!(shift.apply(7), 9);
        assert_eq!(shift.apply(20), 22);

        let shrink = Shift {
            start: 4,
            old_len: 5,
            new_len: 1,
        };
        assert_eq!(shrink.apply(7), 5);
        assert_eq!(shrink.apply(9), 5);
    }

    #[test]
    fn test_shift_positions_walks_entries() {
        let mut data = Vec::new();
        for (pos, id) in [(0u32, 1u32), (10, 2)] {
            data.extend_from_slice(&pos.to_le_bytes());
            data.extend_from_slice(&id.to_le_bytes());
        }
        let shifts = [Shift {
            start: 2,
            old_len: 2,
            new_len: 6,
        }];
        shift_positions(&mut data, 8, &[0], &shifts);
        assert_eq!(read_u32_le(&data, 8).unwrap(), 14);
        assert_eq!(read_u32_le(&data, 12).unwrap(), 2);
    }
}
