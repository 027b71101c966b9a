//! HWPX package (ZIP archive) layout.
//!
//! The archive holds a `mimetype` entry, the `Contents/content.hpf` package
//! manifest whose spine lists the parts in reading order, the
//! `Contents/header.xml` resource part and one `Contents/sectionN.xml` per
//! body section.

use crate::common::detection::utils::HWPX_MIMETYPE;
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::{Cursor, Read};

pub(crate) const MIMETYPE: &str = "mimetype";
pub(crate) const CONTENT_HPF: &str = "Contents/content.hpf";
pub(crate) const HEADER_XML: &str = "Contents/header.xml";

const CONTENTS_DIR: &str = "Contents/";

/// First footnote and endnote numbers declared by the header part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NoteNumbering {
    pub(crate) footnote: u32,
    pub(crate) endnote: u32,
}

impl Default for NoteNumbering {
    fn default() -> Self {
        Self {
            footnote: 1,
            endnote: 1,
        }
    }
}

/// An HWPX package held in memory.
pub(crate) struct Package<'a> {
    archive: zip::ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    /// Open the archive and check its `mimetype` entry when there is one.
    pub(crate) fn open(bytes: &'a [u8]) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut package = Self { archive };

        match package.read_optional(MIMETYPE)? {
            Some(mimetype) if mimetype.trim() != HWPX_MIMETYPE => {
                return Err(Error::UnsupportedFormat(format!(
                    "package mimetype is {:?}, expected {HWPX_MIMETYPE}",
                    mimetype.trim()
                )));
            }
            Some(_) => {}
            None => log::debug!("package has no mimetype entry"),
        }

        Ok(package)
    }

    /// Read a UTF-8 part, failing when it is missing.
    pub(crate) fn read_string(&mut self, name: &str) -> Result<String> {
        self.read_optional(name)?
            .ok_or_else(|| Error::CorruptDocument(format!("missing package part {name}")))
    }

    /// Read a UTF-8 part if the archive has it.
    pub(crate) fn read_optional(&mut self, name: &str) -> Result<Option<String>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| Error::CorruptDocument(format!("{name} is not valid UTF-8")))
    }

    fn has_file(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Section parts in reading order.
    ///
    /// The spine of `content.hpf` decides the order; packages without a
    /// usable manifest fall back to `Contents/sectionN.xml` sorted by `N`.
    pub(crate) fn section_names(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        if let Some(manifest) = self.read_optional(CONTENT_HPF)? {
            for href in spine_hrefs(&manifest)? {
                match self.resolve(&href) {
                    Some(name) if name != HEADER_XML && name.ends_with(".xml") => names.push(name),
                    Some(_) => {}
                    None => log::debug!("spine item {href} is not in the package"),
                }
            }
        }

        if names.is_empty() {
            names = self.numbered_sections();
        }
        if names.is_empty() {
            return Err(Error::CorruptDocument("package has no section parts".to_string()));
        }
        Ok(names)
    }

    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim_start_matches('/');
        if self.has_file(href) {
            return Some(href.to_string());
        }
        let nested = format!("{CONTENTS_DIR}{href}");
        self.has_file(&nested).then_some(nested)
    }

    fn numbered_sections(&self) -> Vec<String> {
        let mut sections: Vec<(u32, String)> = self
            .archive
            .file_names()
            .filter_map(|name| {
                let number = name
                    .strip_prefix(CONTENTS_DIR)?
                    .strip_prefix("section")?
                    .strip_suffix(".xml")?
                    .parse()
                    .ok()?;
                Some((number, name.to_string()))
            })
            .collect();
        sections.sort_by_key(|(number, _)| *number);
        sections.into_iter().map(|(_, name)| name).collect()
    }

    /// Footnote and endnote start numbers from `header.xml`.
    pub(crate) fn note_numbering(&mut self) -> Result<NoteNumbering> {
        let Some(header) = self.read_optional(HEADER_XML)? else {
            log::debug!("package has no {HEADER_XML}");
            return Ok(NoteNumbering::default());
        };
        parse_numbering(&header)
    }
}

/// Value of the attribute whose local name is `name`.
pub(crate) fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name)
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

/// Hrefs of the spine items of a `content.hpf` manifest, in spine order.
fn spine_hrefs(manifest: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(manifest);
    let mut buf = Vec::new();
    let mut items: HashMap<String, String> = HashMap::new();
    let mut spine: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"item" => {
                    if let (Some(id), Some(href)) = (attr(e, b"id"), attr(e, b"href")) {
                        items.insert(id, href);
                    }
                }
                b"itemref" => spine.extend(attr(e, b"idref")),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(spine
        .into_iter()
        .filter_map(|idref| items.get(&idref).cloned())
        .collect())
}

fn parse_numbering(header: &str) -> Result<NoteNumbering> {
    let mut reader = Reader::from_str(header);
    let mut buf = Vec::new();
    let mut numbering = NoteNumbering::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"beginNum" => {
                let number = |name: &[u8]| attr(e, name).and_then(|v| v.trim().parse().ok());
                if let Some(footnote) = number(b"footnote") {
                    numbering.footnote = footnote;
                }
                if let Some(endnote) = number(b"endnote") {
                    numbering.endnote = endnote;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(numbering)
}
