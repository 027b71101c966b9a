//! HWPX write-back.
//!
//! Edited runs are spliced into the raw text of their section part, and the
//! archive is rebuilt with every other entry raw-copied, compressed bytes
//! and all. `mimetype` stays the first entry.

use super::HwpxSource;
use super::package::MIMETYPE;
use crate::common::{Error, Result};
use crate::model::{StructureModel, TextOrigin};
use quick_xml::escape::partial_escape;
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

/// Serialize `model` back into the package it was read from.
pub fn write(source: &HwpxSource, model: &StructureModel) -> Result<Vec<u8>> {
    let mut edits: BTreeMap<u32, Vec<(usize, usize, &str)>> = BTreeMap::new();
    for (origin, text) in model.edited_runs() {
        match origin {
            TextOrigin::Hwpx { part, start, end } => {
                edits.entry(part).or_default().push((start, end, text));
            }
            TextOrigin::Hwp5 { .. } => {
                return Err(Error::UnsupportedWrite(
                    "HWP5 text cannot be written into an HWPX package".to_string(),
                ));
            }
        }
    }

    if edits.is_empty() {
        return Ok(source.bytes.clone());
    }

    let mut parts: HashMap<&str, String> = HashMap::with_capacity(edits.len());
    for (part, spans) in edits {
        let section = source.sections.get(part as usize).ok_or_else(|| {
            Error::CorruptDocument(format!("edited run points at missing section {part}"))
        })?;
        log::debug!("{}: splicing {} edits", section.name, spans.len());
        parts.insert(section.name.as_str(), splice(&section.xml, spans)?);
    }

    rebuild(&source.bytes, &parts)
}

/// Replace raw spans of `xml` with escaped text, last span first.
fn splice(xml: &str, mut spans: Vec<(usize, usize, &str)>) -> Result<String> {
    spans.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = xml.to_string();
    let mut limit = out.len();
    for (start, end, text) in spans {
        if start > end || end > limit || !out.is_char_boundary(start) || !out.is_char_boundary(end) {
            return Err(Error::CorruptDocument(format!(
                "text span {start}..{end} does not fit its section part"
            )));
        }
        out.replace_range(start..end, &partial_escape(text));
        limit = start;
    }
    Ok(out)
}

fn rebuild(bytes: &[u8], parts: &HashMap<&str, String>) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(bytes.len())));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mimetype = archive.index_for_name(MIMETYPE);
    let order: Vec<usize> = mimetype
        .into_iter()
        .chain((0..archive.len()).filter(|&index| Some(index) != mimetype))
        .collect();

    for index in order {
        let entry = archive.by_index_raw(index)?;
        match parts.get(entry.name()) {
            Some(xml) => {
                let name = entry.name().to_string();
                drop(entry);
                writer.start_file(name, options)?;
                writer.write_all(xml.as_bytes())?;
            }
            None => writer.raw_copy_file(entry)?,
        }
    }

    Ok(writer.finish()?.into_inner())
}
