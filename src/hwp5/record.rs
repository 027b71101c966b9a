//! Tagged record stream codec.
//!
//! Every record starts with a 32-bit header: tag in bits 0-9, level in
//! bits 10-19 and payload size in bits 20-31. A size of `0xFFF` means the
//! real size follows as a separate 32-bit value.

use super::Hwp5Error;
use super::consts::EXTENDED_SIZE;
use crate::common::binary::read_u32_le;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub tag: u16,
    pub level: u16,
    pub data: Vec<u8>,
    /// Whether the size was stored in the extended form
    pub extended: bool,
}

impl Record {
    pub fn new(tag: u16, level: u16, data: Vec<u8>) -> Self {
        Self {
            tag,
            level,
            data,
            extended: false,
        }
    }

    /// Append the encoded record to `out`, keeping the source's size form.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let size = self.data.len() as u32;
        let extended = self.extended || size >= EXTENDED_SIZE;
        let packed_size = if extended { EXTENDED_SIZE } else { size };
        let header =
            u32::from(self.tag & 0x3FF) | (u32::from(self.level & 0x3FF) << 10) | (packed_size << 20);
        out.extend_from_slice(&header.to_le_bytes());
        if extended {
            out.extend_from_slice(&size.to_le_bytes());
        }
        out.extend_from_slice(&self.data);
    }
}

/// Split a decompressed stream into records.
pub fn parse_records(stream: &[u8]) -> Result<Vec<Record>, Hwp5Error> {
    let mut records = Vec::new();
    let mut pos = 0usize;

    while pos < stream.len() {
        let remaining = &stream[pos..];
        if remaining.len() < 4 {
            if remaining.iter().all(|&b| b == 0) {
                log::debug!("ignoring {} bytes of stream padding", remaining.len());
                break;
            }
            return Err(truncated(pos, 4, remaining.len()));
        }

        let header = read_u32_le(stream, pos)?;
        pos += 4;
        let tag = (header & 0x3FF) as u16;
        let level = ((header >> 10) & 0x3FF) as u16;
        let mut size = header >> 20;
        let extended = size == EXTENDED_SIZE;
        if extended {
            size = read_u32_le(stream, pos).map_err(|_| truncated(pos, 4, stream.len() - pos))?;
            pos += 4;
        }

        let size = size as usize;
        let Some(data) = stream.get(pos..pos + size) else {
            return Err(truncated(pos, size, stream.len() - pos));
        };
        records.push(Record {
            tag,
            level,
            data: data.to_vec(),
            extended,
        });
        pos += size;
    }

    Ok(records)
}

/// Encode records back into a stream.
pub fn encode_records(records: &[Record]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.iter().map(|r| r.data.len() + 8).sum());
    for record in records {
        record.encode_into(&mut out);
    }
    out
}

fn truncated(offset: usize, needed: usize, available: usize) -> Hwp5Error {
    log::warn!("record stream truncated at offset {offset}");
    Hwp5Error::Truncated {
        what: "record",
        needed,
        available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bit_layout() {
        let record = Record::new(0x43, 2, vec![1, 2, 3]);
        let bytes = encode_records(std::slice::from_ref(&record));
        let header = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(header & 0x3FF, 0x43);
        assert_eq!((header >> 10) & 0x3FF, 2);
        assert_eq!(header >> 20, 3);
        assert_eq!(parse_records(&bytes).unwrap(), vec![record]);
    }

    #[test]
    fn test_extended_size_is_preserved() {
        let big = Record::new(0x43, 0, vec![7u8; 5000]);
        let mut small_extended = Record::new(0x44, 1, vec![1, 2]);
        small_extended.extended = true;

        let bytes = encode_records(&[big.clone(), small_extended.clone()]);
        let parsed = parse_records(&bytes).unwrap();
        assert_eq!(parsed[0].data.len(), 5000);
        assert!(parsed[0].extended);
        assert_eq!(parsed[1], small_extended);
        assert_eq!(encode_records(&parsed), bytes);
    }

    #[test]
    fn test_truncated_payload_is_an_error() {
        let mut bytes = encode_records(&[Record::new(0x42, 0, vec![0u8; 20])]);
        bytes.truncate(bytes.len() - 5);
        assert!(matches!(
            parse_records(&bytes),
            Err(Hwp5Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_trailing_zero_padding_is_ignored() {
        let mut bytes = encode_records(&[Record::new(0x42, 0, vec![1])]);
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(parse_records(&bytes).unwrap().len(), 1);
    }
}
