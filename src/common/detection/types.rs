//! Document type enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Hangul word processor 5.x binary document (compound file, .hwp)
    Hwp,
    /// Hangul word processor XML package (zip, .hwpx)
    Hwpx,
}

impl DocumentType {
    /// Canonical file extension without the dot.
    #[inline]
    pub fn extension(self) -> &'static str {
        match self {
            DocumentType::Hwp => "hwp",
            DocumentType::Hwpx => "hwpx",
        }
    }

    /// Match a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("hwp") {
            Some(DocumentType::Hwp)
        } else if ext.eq_ignore_ascii_case("hwpx") {
            Some(DocumentType::Hwpx)
        } else {
            None
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
