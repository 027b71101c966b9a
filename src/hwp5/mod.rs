//! HWP5 binary documents.
//!
//! An HWP5 file is a compound file. `FileHeader` carries the signature and
//! property flags, `DocInfo` the shared resources, and `BodyText/SectionN`
//! the body as a stream of tagged records, raw-deflated when the header's
//! compressed flag is set.
//!
//! [`read`] decodes every section into a [`StructureModel`] and keeps the
//! decoded records in a [`Hwp5Source`]; [`write`] re-encodes only the
//! records touched by text edits and copies every other stream verbatim.

pub mod consts;
pub mod header;
pub mod record;
pub mod text;

mod parser;
mod template;
mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::common::binary::BinaryError;
use crate::model::StructureModel;
use crate::ole::{OleError, OleFile};
use flate2::read::DeflateDecoder;
use header::FileHeader;
use record::{Record, parse_records};
use std::io::{self, Cursor, Read};

pub use template::blank;
pub use writer::write;

/// Errors raised while decoding an HWP5 document.
#[derive(Debug, thiserror::Error)]
pub enum Hwp5Error {
    #[error(transparent)]
    Ole(#[from] OleError),

    #[error("stream decode failed: {0}")]
    Io(#[from] io::Error),

    #[error("FileHeader signature is not HWP")]
    InvalidSignature,

    #[error("password protected document")]
    Encrypted,

    #[error("distribution document")]
    Distribution,

    #[error("truncated {what}: needed {needed} bytes, {available} available")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("malformed document: {0}")]
    Malformed(String),
}

impl From<BinaryError> for Hwp5Error {
    fn from(err: BinaryError) -> Self {
        Hwp5Error::Malformed(err.to_string())
    }
}

/// Decoded body section.
#[derive(Debug, Clone)]
pub(crate) struct Section {
    /// Stream path, e.g. `["BodyText", "Section0"]`
    pub(crate) path: Vec<String>,
    pub(crate) records: Vec<Record>,
}

/// Source state kept for writing an HWP5 document back.
#[derive(Debug, Clone)]
pub struct Hwp5Source {
    bytes: Vec<u8>,
    header: FileHeader,
    sections: Vec<Section>,
}

impl Hwp5Source {
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

/// Parse an HWP5 document held in memory.
pub fn read(bytes: Vec<u8>) -> Result<(StructureModel, Hwp5Source), Hwp5Error> {
    let (header, sections) = {
        let mut ole = OleFile::open(Cursor::new(bytes.as_slice()))?;
        let header = FileHeader::parse(&ole.open_stream(&["FileHeader"])?)?;
        header.ensure_readable()?;

        if !ole.exists(&["DocInfo"]) {
            log::warn!("document has no DocInfo stream");
        }

        let paths = section_paths(&ole.list_streams());
        if paths.is_empty() {
            return Err(Hwp5Error::Malformed("no BodyText sections".into()));
        }

        let mut sections = Vec::with_capacity(paths.len());
        for path in paths {
            let names: Vec<&str> = path.iter().map(String::as_str).collect();
            let raw = ole.open_stream(&names)?;
            let data = if header.is_compressed() {
                inflate(&raw)?
            } else {
                raw
            };
            log::debug!("{}: {} bytes", path.join("/"), data.len());
            sections.push(Section {
                records: parse_records(&data)?,
                path,
            });
        }
        (header, sections)
    };

    let model = parser::build_model(&sections);
    Ok((
        model,
        Hwp5Source {
            bytes,
            header,
            sections,
        },
    ))
}

/// `BodyText/SectionN` streams in numeric order.
fn section_paths(streams: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut sections: Vec<(u32, Vec<String>)> = streams
        .iter()
        .filter_map(|path| match path.as_slice() {
            [storage, name] if storage.eq_ignore_ascii_case("BodyText") => name
                .strip_prefix("Section")
                .and_then(|n| n.parse().ok())
                .map(|n| (n, path.clone())),
            _ => None,
        })
        .collect();
    sections.sort_by_key(|(n, _)| *n);
    sections.into_iter().map(|(_, path)| path).collect()
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, Hwp5Error> {
    let mut out = Vec::with_capacity(data.len() * 4);
    DeflateDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, Hwp5Error> {
    use flate2::{Compression, write::DeflateEncoder};
    use std::io::Write;

    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
