//! Blank HWP5 document.

use super::consts::*;
use super::header::{FileHeader, HeaderFlags};
use super::record::{Record, encode_records};
use super::{Hwp5Error, deflate};
use crate::ole::OleWriter;

/// Version written into new documents (5.0.3.0).
const BLANK_VERSION: u32 = 0x0500_0300;

/// `PARA_HEADER` payload for an empty paragraph: one character (the
/// paragraph end), paragraph shape 0, style 0, one char shape.
fn empty_para_header() -> Vec<u8> {
    let mut data = vec![0u8; 22];
    data[0..4].copy_from_slice(&1u32.to_le_bytes());
    data[12..14].copy_from_slice(&1u16.to_le_bytes());
    data
}

/// Build a compressed single-section document holding one empty paragraph.
pub fn blank() -> Result<Vec<u8>, Hwp5Error> {
    let header = FileHeader {
        version: BLANK_VERSION,
        flags: HeaderFlags::COMPRESSED,
    };

    let section = encode_records(&[
        Record::new(HWPTAG_PARA_HEADER, 0, empty_para_header()),
        Record::new(HWPTAG_PARA_TEXT, 1, CH_PARA_END.to_le_bytes().to_vec()),
        Record::new(HWPTAG_PARA_CHAR_SHAPE, 1, vec![0u8; 8]),
    ]);

    let mut writer = OleWriter::new();
    writer.create_stream(&["FileHeader"], &header.to_bytes())?;
    writer.create_stream(&["DocInfo"], &deflate(&[])?)?;
    writer.create_stream(&["BodyText", "Section0"], &deflate(&section)?)?;
    Ok(writer.to_bytes()?)
}
