//! Utility constants for file format detection.

// Magic number signatures
pub const OLE2_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
pub const ZIP_SIGNATURE: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// MIME type stored in the `mimetype` entry of an HWPX package.
pub const HWPX_MIMETYPE: &str = "application/hwp+zip";

/// Signature at the start of the HWP5 `FileHeader` stream.
pub const HWP5_SIGNATURE: &[u8] = b"HWP Document File";

/// Check whether `bytes` begins with `signature`.
#[inline]
pub fn starts_with(bytes: &[u8], signature: &[u8]) -> bool {
    bytes.len() >= signature.len() && &bytes[..signature.len()] == signature
}
