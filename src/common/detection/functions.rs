//! Core file format detection functions.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::types::DocumentType;
use super::utils;
use crate::common::{Error, Result};

/// Classify a path by its extension alone.
///
/// This never touches the file system, so it can reject a `.txt` path before
/// any open is attempted.
///
/// # Examples
///
/// ```rust
/// use hanji::common::detection::{detect_format_from_extension, DocumentType};
///
/// assert_eq!(detect_format_from_extension("report.HWPX").unwrap(), DocumentType::Hwpx);
/// assert!(detect_format_from_extension("notes.txt").is_err());
/// ```
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> Result<DocumentType> {
    let path = path.as_ref();
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(DocumentType::from_extension)
        .ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                "unsupported extension for {} (expected .hwp or .hwpx)",
                path.display()
            ))
        })
}

/// Detect the document type from a file path by content.
///
/// Returns `Ok(None)` when the file exists but is not an HWP or HWPX document.
pub fn detect_file_format<P: AsRef<Path>>(path: P) -> Result<Option<DocumentType>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| Error::from_open(e, path))?;
    Ok(detect_format_from_reader(&mut file))
}

/// Detect the document type from a byte slice.
///
/// The compound-file signature selects HWP5 and the zip signature selects
/// HWPX; when the matching format feature is enabled the container is also
/// opened to confirm that it really holds an HWP document.
pub fn detect_format_from_bytes(bytes: &[u8]) -> Option<DocumentType> {
    if utils::starts_with(bytes, utils::OLE2_SIGNATURE) {
        return confirm_hwp5(bytes).then_some(DocumentType::Hwp);
    }

    if utils::starts_with(bytes, utils::ZIP_SIGNATURE) {
        return confirm_hwpx(bytes).then_some(DocumentType::Hwpx);
    }

    None
}

/// Detect the document type from any reader that implements Read + Seek.
///
/// The reader is rewound to the start before returning. A reader that cannot
/// be rewound is reported as undetected.
pub fn detect_format_from_reader<R: Read + Seek>(reader: &mut R) -> Option<DocumentType> {
    let mut header = [0u8; 8];
    let read = reader.read_exact(&mut header);
    rewind(reader)?;
    if read.is_err()
        || (!utils::starts_with(&header, utils::OLE2_SIGNATURE)
            && !utils::starts_with(&header, utils::ZIP_SIGNATURE))
    {
        return None;
    }

    let mut data = Vec::new();
    let read = reader.read_to_end(&mut data);
    rewind(reader)?;
    read.ok()?;

    detect_format_from_bytes(&data)
}

fn rewind<R: Seek>(reader: &mut R) -> Option<()> {
    match reader.seek(SeekFrom::Start(0)) {
        Ok(_) => Some(()),
        Err(err) => {
            log::warn!("cannot rewind reader after format detection: {err}");
            None
        }
    }
}

/// Resolve the type of `bytes`, checking it against a declared type.
///
/// A declared type (from the extension) that contradicts the content, or
/// content that is neither HWP nor HWPX, fails with `UnsupportedFormat`.
pub fn resolve_format(declared: Option<DocumentType>, bytes: &[u8]) -> Result<DocumentType> {
    let detected = detect_format_from_bytes(bytes).ok_or_else(|| {
        Error::UnsupportedFormat("content is neither an HWP nor an HWPX document".to_string())
    })?;

    match declared {
        Some(expected) if expected != detected => Err(Error::UnsupportedFormat(format!(
            "declared .{} but content is {}",
            expected, detected
        ))),
        _ => Ok(detected),
    }
}

#[cfg(feature = "hwp5")]
fn confirm_hwp5(bytes: &[u8]) -> bool {
    let Ok(mut ole) = crate::ole::OleFile::open(std::io::Cursor::new(bytes)) else {
        return false;
    };
    match ole.open_stream(&["FileHeader"]) {
        Ok(header) => utils::starts_with(&header, utils::HWP5_SIGNATURE),
        Err(_) => false,
    }
}

#[cfg(not(feature = "hwp5"))]
fn confirm_hwp5(_bytes: &[u8]) -> bool {
    true
}

#[cfg(feature = "hwpx")]
fn confirm_hwpx(bytes: &[u8]) -> bool {
    let Ok(mut archive) = zip::ZipArchive::new(std::io::Cursor::new(bytes)) else {
        return false;
    };

    if let Ok(mut entry) = archive.by_name("mimetype") {
        let mut mimetype = String::new();
        if entry.read_to_string(&mut mimetype).is_ok() {
            return mimetype.trim() == utils::HWPX_MIMETYPE;
        }
    }

    // Some producers omit the mimetype entry
    archive.index_for_name("Contents/header.xml").is_some()
}

#[cfg(not(feature = "hwpx"))]
fn confirm_hwpx(_bytes: &[u8]) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_rules() {
        assert_eq!(
            detect_format_from_extension("/a/b/doc.hwp").unwrap(),
            DocumentType::Hwp
        );
        assert_eq!(
            detect_format_from_extension("doc.Hwpx").unwrap(),
            DocumentType::Hwpx
        );
        assert!(
            detect_format_from_extension("/some/path/file.txt")
                .unwrap_err()
                .is_unsupported_format()
        );
        assert!(detect_format_from_extension("no_extension").is_err());
    }

    #[test]
    fn test_unknown_signature() {
        assert_eq!(detect_format_from_bytes(b"plain text"), None);
        assert_eq!(detect_format_from_bytes(&[]), None);
        assert!(resolve_format(None, b"plain text").is_err());
    }

    #[test]
    fn test_bare_ole_signature_is_not_hwp() {
        // Just having the compound-file signature is not enough
        let format = detect_format_from_bytes(utils::OLE2_SIGNATURE);
        assert!(format.is_none());
    }

    /// Reads like its inner cursor but refuses every seek.
    struct Unseekable(std::io::Cursor<Vec<u8>>);

    impl Read for Unseekable {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Seek for Unseekable {
        fn seek(&mut self, _: SeekFrom) -> std::io::Result<u64> {
            Err(std::io::Error::other("seek refused"))
        }
    }

    #[cfg(feature = "hwpx")]
    #[test]
    fn test_reader_is_rewound_after_detection() {
        let bytes = crate::hwpx::fixtures::document(vec![vec![vec![crate::fixtures::text("x")]]]);
        let mut cursor = std::io::Cursor::new(bytes.clone());
        assert_eq!(detect_format_from_reader(&mut cursor), Some(DocumentType::Hwpx));
        assert_eq!(cursor.position(), 0);

        let mut unseekable = Unseekable(std::io::Cursor::new(bytes));
        assert_eq!(detect_format_from_reader(&mut unseekable), None);
    }

    #[test]
    fn test_short_reader_is_rewound() {
        let mut cursor = std::io::Cursor::new(b"PK".to_vec());
        assert_eq!(detect_format_from_reader(&mut cursor), None);
        assert_eq!(cursor.position(), 0);

        let mut unseekable = Unseekable(std::io::Cursor::new(b"PK\x03\x04rest".to_vec()));
        assert_eq!(detect_format_from_reader(&mut unseekable), None);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = detect_file_format("/nonexistent/path/file.hwp").unwrap_err();
        assert!(err.is_not_found());
    }
}
