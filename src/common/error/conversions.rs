//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;

// Conversions from internal error types
#[cfg(feature = "hwp5")]
impl From<crate::ole::OleError> for Error {
    fn from(err: crate::ole::OleError) -> Self {
        match err {
            crate::ole::OleError::Io(e) => Error::Io(e),
            crate::ole::OleError::NotOleFile => {
                Error::UnsupportedFormat("not a compound binary file".to_string())
            },
            crate::ole::OleError::InvalidFormat(s) => Error::CorruptDocument(s),
            crate::ole::OleError::CorruptedFile(s) => Error::CorruptDocument(s),
            crate::ole::OleError::StreamNotFound(s) => {
                Error::CorruptDocument(format!("stream not found: {}", s))
            },
        }
    }
}

#[cfg(feature = "hwp5")]
impl From<crate::hwp5::Hwp5Error> for Error {
    fn from(err: crate::hwp5::Hwp5Error) -> Self {
        use crate::hwp5::Hwp5Error;
        match err {
            Hwp5Error::Ole(e) => Error::from(e),
            Hwp5Error::Io(e) => Error::CorruptDocument(format!("stream decode failed: {}", e)),
            Hwp5Error::InvalidSignature => {
                Error::UnsupportedFormat("FileHeader signature is not HWP".to_string())
            },
            Hwp5Error::Encrypted => {
                Error::UnsupportedFormat("password protected documents are not supported".to_string())
            },
            Hwp5Error::Distribution => {
                Error::UnsupportedFormat("distribution documents are not supported".to_string())
            },
            Hwp5Error::Truncated { .. } | Hwp5Error::Malformed(_) => {
                Error::CorruptDocument(err.to_string())
            },
        }
    }
}

impl From<crate::common::binary::BinaryError> for Error {
    fn from(err: crate::common::binary::BinaryError) -> Self {
        Error::CorruptDocument(err.to_string())
    }
}

#[cfg(feature = "hwpx")]
impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::CorruptDocument(format!("XML error: {}", err))
    }
}

#[cfg(feature = "hwpx")]
impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        // Archives live in memory buffers; any failure here is a damaged entry.
        Error::CorruptDocument(format!("ZIP error: {}", err))
    }
}
