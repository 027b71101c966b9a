//! The `FileHeader` stream.

use super::Hwp5Error;
use crate::common::detection::utils::HWP5_SIGNATURE;
use bitflags::bitflags;
use std::fmt;
use zerocopy::{FromBytes, LE, U32};
use zerocopy_derive::{FromBytes as DeriveFromBytes, Immutable, KnownLayout};

/// Length of the `FileHeader` stream
pub const FILE_HEADER_SIZE: usize = 256;

bitflags! {
    /// Document property bits from the file header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HeaderFlags: u32 {
        const COMPRESSED = 1 << 0;
        const PASSWORD = 1 << 1;
        const DISTRIBUTION = 1 << 2;
        const SCRIPT = 1 << 3;
        const DRM = 1 << 4;
    }
}

#[derive(Debug, DeriveFromBytes, KnownLayout, Immutable)]
#[repr(C)]
struct RawFileHeader {
    signature: [u8; 32],
    version: U32<LE>,
    properties: U32<LE>,
}

/// Parsed `FileHeader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Packed `MM.nn.PP.rr` version
    pub version: u32,
    pub flags: HeaderFlags,
}

impl FileHeader {
    pub fn parse(data: &[u8]) -> Result<Self, Hwp5Error> {
        let (raw, _) = RawFileHeader::read_from_prefix(data).map_err(|_| Hwp5Error::Truncated {
            what: "FileHeader",
            needed: size_of::<RawFileHeader>(),
            available: data.len(),
        })?;

        if !raw.signature.starts_with(HWP5_SIGNATURE) {
            return Err(Hwp5Error::InvalidSignature);
        }

        Ok(Self {
            version: raw.version.get(),
            flags: HeaderFlags::from_bits_retain(raw.properties.get()),
        })
    }

    pub fn is_compressed(&self) -> bool {
        self.flags.contains(HeaderFlags::COMPRESSED)
    }

    /// Reject documents whose body cannot be read without a key.
    pub fn ensure_readable(&self) -> Result<(), Hwp5Error> {
        if self.flags.intersects(HeaderFlags::PASSWORD | HeaderFlags::DRM) {
            return Err(Hwp5Error::Encrypted);
        }
        if self.flags.contains(HeaderFlags::DISTRIBUTION) {
            return Err(Hwp5Error::Distribution);
        }
        Ok(())
    }

    /// Encode a header for a new document.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; FILE_HEADER_SIZE];
        out[..HWP5_SIGNATURE.len()].copy_from_slice(HWP5_SIGNATURE);
        out[32..36].copy_from_slice(&self.version.to_le_bytes());
        out[36..40].copy_from_slice(&self.flags.bits().to_le_bytes());
        out
    }
}

impl fmt::Display for FileHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.version.to_be_bytes();
        write!(f, "{}.{}.{}.{}", v[0], v[1], v[2], v[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip_and_flags() {
        let header = FileHeader {
            version: 0x0500_0300,
            flags: HeaderFlags::COMPRESSED,
        };
        let parsed = FileHeader::parse(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.is_compressed());
        assert!(parsed.ensure_readable().is_ok());
        assert_eq!(parsed.to_string(), "5.0.3.0");
    }

    #[test]
    fn test_locked_documents_are_rejected() {
        let mut header = FileHeader {
            version: 0x0500_0000,
            flags: HeaderFlags::PASSWORD,
        };
        assert!(matches!(header.ensure_readable(), Err(Hwp5Error::Encrypted)));
        header.flags = HeaderFlags::DISTRIBUTION;
        assert!(matches!(header.ensure_readable(), Err(Hwp5Error::Distribution)));
    }

    #[test]
    fn test_bad_signature_and_short_header() {
        assert!(matches!(
            FileHeader::parse(&[0u8; 256]),
            Err(Hwp5Error::InvalidSignature)
        ));
        assert!(matches!(
            FileHeader::parse(b"HWP"),
            Err(Hwp5Error::Truncated { .. })
        ));
    }
}
