//! Record tags, control characters and control ids of the HWP5 body stream.

/// First tag value of the document model records
pub const HWPTAG_BEGIN: u16 = 0x010;

pub const HWPTAG_PARA_HEADER: u16 = HWPTAG_BEGIN + 50;
pub const HWPTAG_PARA_TEXT: u16 = HWPTAG_BEGIN + 51;
pub const HWPTAG_PARA_CHAR_SHAPE: u16 = HWPTAG_BEGIN + 52;
pub const HWPTAG_PARA_LINE_SEG: u16 = HWPTAG_BEGIN + 53;
pub const HWPTAG_PARA_RANGE_TAG: u16 = HWPTAG_BEGIN + 54;
pub const HWPTAG_CTRL_HEADER: u16 = HWPTAG_BEGIN + 55;
pub const HWPTAG_LIST_HEADER: u16 = HWPTAG_BEGIN + 56;
pub const HWPTAG_TABLE: u16 = HWPTAG_BEGIN + 61;
pub const HWPTAG_CTRL_DATA: u16 = HWPTAG_BEGIN + 71;
pub const HWPTAG_MEMO_LIST: u16 = HWPTAG_BEGIN + 77;

/// Size value meaning "a 32-bit size follows the header"
pub const EXTENDED_SIZE: u32 = 0xFFF;

// Control characters inside PARA_TEXT
pub const CH_FIELD_START: u16 = 3;
pub const CH_FIELD_END: u16 = 4;
pub const CH_TAB: u16 = 9;
pub const CH_LINE_BREAK: u16 = 10;
pub const CH_TABLE_OR_DRAWING: u16 = 11;
pub const CH_PARA_END: u16 = 13;
pub const CH_NOTE: u16 = 17;
pub const CH_HYPHEN: u16 = 24;
pub const CH_NBSPACE: u16 = 30;
pub const CH_FIXED_SPACE: u16 = 31;

/// Width in UTF-16 units of inline and extended controls
pub const CONTROL_WIDTH: usize = 8;

/// Build a control id from its four-character name.
///
/// Control ids are stored as little-endian u32 values whose most significant
/// byte is the first character, so `"tbl "` reads back as `b" lbt"` on disk.
pub const fn ctrl_id(name: &[u8; 4]) -> u32 {
    ((name[0] as u32) << 24) | ((name[1] as u32) << 16) | ((name[2] as u32) << 8) | name[3] as u32
}

pub const CTRL_TABLE: u32 = ctrl_id(b"tbl ");
pub const CTRL_FOOTNOTE: u32 = ctrl_id(b"fn  ");
pub const CTRL_ENDNOTE: u32 = ctrl_id(b"en  ");
pub const CTRL_FIELD_HYPERLINK: u32 = ctrl_id(b"%hlk");
pub const CTRL_FIELD_MEMO: u32 = ctrl_id(b"%%me");

/// Whether a control id names a field (`%xxx`), which pairs with a field end.
pub const fn is_field(id: u32) -> bool {
    (id >> 24) as u8 == b'%'
}

/// Units occupied by a control character, or `None` for ordinary text.
pub fn control_width(unit: u16) -> Option<usize> {
    match unit {
        0 | 10 | 13 | 24..=31 => Some(1),
        1..=9 | 11 | 12 | 14..=23 => Some(CONTROL_WIDTH),
        _ => None,
    }
}

/// Extended controls own a CTRL_HEADER record; inline controls do not.
pub fn is_extended_control(unit: u16) -> bool {
    matches!(unit, 1 | 2 | 3 | 11 | 12 | 14..=18 | 21..=23)
}
