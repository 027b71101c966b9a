//! `PARA_TEXT` decoding and encoding.

use super::consts::*;
use crate::common::binary::utf16_units;

/// A piece of paragraph text between control characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Ordinary characters at UTF-16 units `start..start + len`
    Text { start: u32, len: u32, text: String },
    /// Control rendered as fixed text (tab, line break, special spaces)
    Fixed(&'static str),
    /// Extended control; `ordinal` is its position among the paragraph's CTRL_HEADERs
    Control { code: u16, ordinal: usize },
    FieldEnd,
}

/// Decode a `PARA_TEXT` payload into segments.
pub fn decode_para_text(data: &[u8]) -> Vec<Segment> {
    let units = utf16_units(data);
    let mut segments = Vec::new();
    let mut ordinal = 0usize;
    let mut pos = 0usize;
    let mut text_start = 0usize;

    let flush = |segments: &mut Vec<Segment>, from: usize, to: usize| {
        if to > from {
            segments.push(Segment::Text {
                start: from as u32,
                len: (to - from) as u32,
                text: String::from_utf16_lossy(&units[from..to]),
            });
        }
    };

    while pos < units.len() {
        let unit = units[pos];
        let Some(width) = control_width(unit) else {
            pos += 1;
            continue;
        };

        flush(&mut segments, text_start, pos);
        if pos + width > units.len() {
            log::warn!("control {unit} cut short at unit {pos} of {}", units.len());
            text_start = units.len();
            break;
        }

        match unit {
            CH_TAB => segments.push(Segment::Fixed("\t")),
            CH_LINE_BREAK => segments.push(Segment::Fixed("\n")),
            CH_HYPHEN => segments.push(Segment::Fixed("-")),
            CH_NBSPACE | CH_FIXED_SPACE => segments.push(Segment::Fixed(" ")),
            CH_FIELD_END => segments.push(Segment::FieldEnd),
            code if is_extended_control(code) => {
                segments.push(Segment::Control { code, ordinal });
                ordinal += 1;
            }
            // Paragraph end and the remaining reserved controls carry no text.
            _ => {}
        }

        pos += width;
        text_start = pos;
    }
    flush(&mut segments, text_start, units.len().max(text_start));

    segments
}

/// Encode replacement text as `PARA_TEXT` units.
///
/// Tabs become inline tab controls and newlines line breaks; any other
/// control character is replaced by a space so it cannot be mistaken for a
/// control on the next read.
pub fn encode_text(text: &str) -> Vec<u16> {
    let mut units = Vec::with_capacity(text.len());
    let mut buf = [0u16; 2];
    for ch in text.chars() {
        match ch {
            '\t' => {
                units.push(CH_TAB);
                units.extend_from_slice(&[0; CONTROL_WIDTH - 2]);
                units.push(CH_TAB);
            }
            '\n' => units.push(CH_LINE_BREAK),
            c if (c as u32) < 0x20 => units.push(u16::from(b' ')),
            c => units.extend_from_slice(c.encode_utf16(&mut buf)),
        }
    }
    units
}

/// Read the command string of a field `CTRL_HEADER`.
///
/// Layout after the control id: properties (u32), extra properties (u8),
/// command length in units (u16) and the UTF-16LE command.
pub fn field_command(ctrl_header: &[u8]) -> Option<String> {
    const LEN_OFFSET: usize = 9;
    let len_bytes = ctrl_header.get(LEN_OFFSET..LEN_OFFSET + 2)?;
    let len = u16::from_le_bytes([len_bytes[0], len_bytes[1]]) as usize;
    let start = LEN_OFFSET + 2;
    let raw = ctrl_header.get(start..start + len * 2)?;
    let (text, _, had_errors) = encoding_rs::UTF_16LE.decode(raw);
    if had_errors {
        log::debug!("field command contains invalid UTF-16");
    }
    Some(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::binary::units_to_bytes;

    fn control(code: u16) -> Vec<u16> {
        let mut units = vec![code; CONTROL_WIDTH];
        units[1..CONTROL_WIDTH - 1].fill(0);
        units
    }

    #[test]
    fn test_decode_splits_at_controls() {
        let mut units: Vec<u16> = "ab".encode_utf16().collect();
        units.extend(control(CH_NOTE));
        units.extend("c".encode_utf16());
        units.extend(control(CH_TAB));
        units.push(CH_LINE_BREAK);
        units.extend("한글".encode_utf16());
        units.push(CH_PARA_END);

        let segments = decode_para_text(&units_to_bytes(&units));
        assert_eq!(
            segments,
            vec![
                Segment::Text {
                    start: 0,
                    len: 2,
                    text: "ab".into()
                },
                Segment::Control {
                    code: CH_NOTE,
                    ordinal: 0
                },
                Segment::Text {
                    start: 10,
                    len: 1,
                    text: "c".into()
                },
                Segment::Fixed("\t"),
                Segment::Fixed("\n"),
                Segment::Text {
                    start: 20,
                    len: 2,
                    text: "한글".into()
                },
            ]
        );
    }

    #[test]
    fn test_field_markers_are_counted_as_controls() {
        let mut units = control(CH_FIELD_START);
        units.extend("link".encode_utf16());
        units.extend(control(CH_FIELD_END));
        units.extend(control(CH_TABLE_OR_DRAWING));

        let segments = decode_para_text(&units_to_bytes(&units));
        assert_eq!(segments.len(), 4);
        assert_eq!(
            segments[3],
            Segment::Control {
                code: CH_TABLE_OR_DRAWING,
                ordinal: 1
            }
        );
        assert_eq!(segments[2], Segment::FieldEnd);
    }

    #[test]
    fn test_truncated_control_stops_decoding() {
        let mut units: Vec<u16> = "x".encode_utf16().collect();
        units.extend_from_slice(&[CH_NOTE, 0, 0]);
        let segments = decode_para_text(&units_to_bytes(&units));
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_encode_text_sanitizes_controls() {
        let units = encode_text("a\tb\nc\u{1}");
        assert_eq!(units.len(), 1 + CONTROL_WIDTH + 1 + 1 + 1 + 1);
        let decoded = decode_para_text(&units_to_bytes(&units));
        assert_eq!(decoded[1], Segment::Fixed("\t"));
        assert_eq!(decoded[3], Segment::Fixed("\n"));
        assert_eq!(*units.last().unwrap(), u16::from(b' '));
    }

    #[test]
    fn test_field_command_reads_utf16() {
        let command: Vec<u16> = "https\\://x.org;1;".encode_utf16().collect();
        let mut header = CTRL_FIELD_HYPERLINK.to_le_bytes().to_vec();
        header.extend_from_slice(&[0, 0, 0, 0, 0]);
        header.extend_from_slice(&(command.len() as u16).to_le_bytes());
        header.extend_from_slice(&units_to_bytes(&command));
        header.extend_from_slice(&7u32.to_le_bytes());

        let parsed = field_command(&header).unwrap();
        assert_eq!(parsed, "https\\://x.org;1;");
        assert!(field_command(&header[..6]).is_none());
    }
}
